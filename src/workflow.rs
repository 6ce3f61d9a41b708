// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Analyze-and-record flow shared by the CLI commands

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::assessment::Assessment;
use crate::client::{artifact_filename, AnalysisService, ArtifactKind};
use crate::db::ProfileStore;
use crate::models::{AnalysisRecord, Profile};
use crate::repository::ProfileRepository;
use crate::Result;

/// An analysis that has been stored in a profile's history
#[derive(Debug, Clone)]
pub struct RecordedAnalysis {
    pub timestamp: String,
    pub record: AnalysisRecord,
    pub assessment: Assessment,
}

/// Send `image` to the server and append the result to the profile's history
///
/// Nothing is stored when the server call fails.
pub async fn analyze_and_record<S, A>(
    service: &A,
    repo: &ProfileRepository<S>,
    profile: &Profile,
    image: &Path,
) -> Result<RecordedAnalysis>
where
    S: ProfileStore,
    A: AnalysisService + ?Sized,
{
    let record = service.analyze(image).await?;
    let timestamp = repo.add_analysis_now(profile, record.clone())?;
    info!("Stored analysis for {} at {}", profile.key(), timestamp);

    Ok(RecordedAnalysis {
        assessment: Assessment::of(&record),
        timestamp,
        record,
    })
}

/// Download every visualization the record points at into `dir`
///
/// A failed download is logged and skipped. Returns the files written.
pub async fn download_artifacts<A>(service: &A, record: &AnalysisRecord, dir: &Path) -> Result<Vec<PathBuf>>
where
    A: AnalysisService + ?Sized,
{
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::new();
    for server_path in record.artifact_paths() {
        let name = artifact_filename(server_path);
        if name.is_empty() {
            continue;
        }
        match service.fetch_artifact(ArtifactKind::Image, server_path).await {
            Ok(bytes) => {
                let target = dir.join(name);
                tokio::fs::write(&target, bytes).await?;
                written.push(target);
            }
            Err(e) => warn!("Failed to download {}: {}", server_path, e),
        }
    }
    Ok(written)
}
