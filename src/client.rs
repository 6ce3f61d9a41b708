// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP client for the remote tongue analysis server

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::models::{AnalysisRecord, HealthStatus};
use crate::{Result, TrackerError};

/// Files the server can hand back after an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Csv,
}

impl ArtifactKind {
    fn route(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Csv => "csv",
        }
    }
}

/// Operations offered by the analysis server
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn health_check(&self) -> Result<HealthStatus>;

    /// Upload an image and return the server's analysis
    async fn analyze(&self, image: &Path) -> Result<AnalysisRecord>;

    /// Download a generated file by the path the server reported for it
    async fn fetch_artifact(&self, kind: ArtifactKind, server_path: &str) -> Result<Vec<u8>>;

    /// Send one chat message and return the assistant's reply
    async fn send_chat(&self, message: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    reply: String,
}

/// Final segment of a server-side path; the download routes take only the name
pub fn artifact_filename(server_path: &str) -> &str {
    server_path.rsplit('/').next().unwrap_or(server_path)
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// reqwest-backed [`AnalysisService`]
pub struct AnalysisClient {
    client: Client,
    base_url: String,
}

impl AnalysisClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    fn ensure_success(response: Response, route: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(TrackerError::ServerStatus {
                endpoint: route.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    async fn health_check(&self) -> Result<HealthStatus> {
        let response = self.client.get(self.endpoint("health")).send().await?;
        let response = Self::ensure_success(response, "health")?;
        Ok(response.json().await?)
    }

    async fn analyze(&self, image: &Path) -> Result<AnalysisRecord> {
        let data = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        info!("Uploading {} ({} bytes) for analysis", file_name, data.len());

        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(content_type_for(image))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("analyze_tongue"))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response, "analyze_tongue")?;

        let record: AnalysisRecord = response.json().await?;
        debug!("Analysis received: summary={:?}", record.summary);
        Ok(record)
    }

    async fn fetch_artifact(&self, kind: ArtifactKind, server_path: &str) -> Result<Vec<u8>> {
        let route = format!("{}/{}", kind.route(), artifact_filename(server_path));
        debug!("Fetching {}", route);

        let response = self.client.get(self.endpoint(&route)).send().await?;
        let response = Self::ensure_success(response, &route)?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn send_chat(&self, message: &str) -> Result<String> {
        if message.trim().is_empty() {
            return Err(TrackerError::EmptyMessage);
        }

        let response = self
            .client
            .post(self.endpoint("chat"))
            .json(&ChatRequest { message })
            .send()
            .await?;
        let response = Self::ensure_success(response, "chat")?;

        let chat: ChatResponse = response.json().await?;
        debug!("Chat reply: {} chars", chat.reply.len());
        Ok(chat.reply)
    }
}
