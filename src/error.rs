// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for tongue-tracker

use thiserror::Error;

/// Result type alias for tongue-tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Tongue-tracker error types
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Chat message is empty")]
    EmptyMessage,

    #[error("Analysis server returned status {status} for {endpoint}")]
    ServerStatus { endpoint: String, status: u16 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
