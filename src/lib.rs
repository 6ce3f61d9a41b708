// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Tongue Tracker: tongue image analysis with local per-profile history
//!
//! Images are analyzed by a remote server; results are kept per user profile
//! in SQLite and merged on every write so no earlier analysis is lost.

pub mod assessment;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod models;
pub mod repository;
pub mod workflow;

pub use config::AppConfig;
pub use error::{Result, TrackerError};
