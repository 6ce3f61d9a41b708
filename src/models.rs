// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Profiles and analysis payloads
//!
//! `AnalysisRecord` mirrors the JSON returned by the analysis server field for
//! field. Every field is optional; the store keeps whatever arrived and leaves
//! interpretation to [`crate::assessment`].

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Format of history keys. Fixed width, so lexicographic order is chronological.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Gender options offered when creating a profile. Any string is accepted.
pub const GENDER_OPTIONS: [&str; 4] = ["Male", "Female", "Other", "Prefer not to say"];

/// Analyses of one profile keyed by timestamp
pub type AnalysisHistory = BTreeMap<String, AnalysisRecord>;

/// Format a local date-time as a history key
pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// History key for the current local time
pub fn now_timestamp() -> String {
    format_timestamp(&Local::now().naive_local())
}

/// A user profile and its analysis history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: String,
    pub gender: String,
    #[serde(default)]
    pub history: AnalysisHistory,
}

/// The (name, age, gender) triple that identifies a stored profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileKey<'a> {
    pub name: &'a str,
    pub age: &'a str,
    pub gender: &'a str,
}

impl fmt::Display for ProfileKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.age, self.gender)
    }
}

impl Profile {
    /// Create a profile with an empty history
    pub fn new(name: impl Into<String>, age: impl Into<String>, gender: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: age.into(),
            gender: gender.into(),
            history: AnalysisHistory::new(),
        }
    }

    pub fn key(&self) -> ProfileKey<'_> {
        ProfileKey {
            name: &self.name,
            age: &self.age,
            gender: &self.gender,
        }
    }
}

/// One analysis result as returned by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(rename = "Jaggedness", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub jaggedness: Option<String>,

    #[serde(rename = "Cracks", default, skip_serializing_if = "Option::is_none")]
    pub cracks: Option<CrackDetail>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub redness: Option<String>,

    #[serde(rename = "Summary", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(rename = "MantleScore", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub mantle_score: Option<String>,

    #[serde(rename = "NutritionScore", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub nutrition_score: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmented_image_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_coating: Option<WhiteCoating>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub papillae_analysis: Option<PapillaeAnalysis>,
}

/// Crack morphology and score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrackDetail {
    /// Server path of the crack visualization image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhiteCoating {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_coating_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PapillaeAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_papillae: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_redness: Option<f64>,
}

impl AnalysisRecord {
    /// Server paths of every generated visualization image
    pub fn artifact_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        if let Some(path) = self.segmented_image_path.as_deref() {
            paths.push(path);
        }
        if let Some(path) = self.white_coating.as_ref().and_then(|c| c.visualization_path.as_deref()) {
            paths.push(path);
        }
        if let Some(path) = self.cracks.as_ref().and_then(|c| c.morph.as_deref()) {
            paths.push(path);
        }
        paths
    }
}

/// Response of the server health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub sam_model: String,
    #[serde(default)]
    pub roboflow_client: String,
}

// Scores are documented as strings but some server builds emit bare numbers.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
