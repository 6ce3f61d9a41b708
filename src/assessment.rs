// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Condition severities and recommendations derived from an analysis
//!
//! Missing or unparseable scores count as 0 here; the stored record is never
//! rewritten.

use serde::Serialize;
use std::fmt;

use crate::models::AnalysisRecord;

/// Parse a server score such as `"42.5"` or `"42.5 %"`; anything else is 0
pub fn parse_score(raw: Option<&str>) -> f32 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').map(str::trim).unwrap_or(trimmed);
    number
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ConditionSeverity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl fmt::Display for ConditionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Normal => "Normal",
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        };
        f.write_str(label)
    }
}

/// One assessed condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionResult {
    pub name: &'static str,
    pub description: String,
    pub status: String,
    /// Score as a fraction of 100
    pub confidence: f32,
    pub severity: ConditionSeverity,
}

/// Conditions and recommendations for one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub conditions: Vec<ConditionResult>,
    pub recommendations: Vec<String>,
}

impl Assessment {
    pub fn of(record: &AnalysisRecord) -> Self {
        Self {
            conditions: assess(record),
            recommendations: recommendations(record),
        }
    }
}

/// The four scores every assessment works from, as percentages
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scores {
    coating: f32,
    jaggedness: f32,
    cracks: f32,
    redness: f32,
}

impl Scores {
    fn of(record: &AnalysisRecord) -> Self {
        Self {
            coating: record
                .white_coating
                .as_ref()
                .and_then(|c| c.white_coating_percentage)
                .filter(|v| v.is_finite())
                .unwrap_or(0.0) as f32,
            jaggedness: parse_score(record.jaggedness.as_deref()),
            cracks: parse_score(record.cracks.as_ref().and_then(|c| c.score.as_deref())),
            redness: parse_score(record.redness.as_deref()),
        }
    }
}

fn coating_severity(percent: f32) -> ConditionSeverity {
    if percent > 80.0 {
        ConditionSeverity::Severe
    } else if percent > 60.0 {
        ConditionSeverity::Moderate
    } else if percent > 40.0 {
        ConditionSeverity::Mild
    } else {
        ConditionSeverity::Normal
    }
}

// Shared by jaggedness and cracks.
fn surface_severity(percent: f32) -> ConditionSeverity {
    if percent < 20.0 {
        ConditionSeverity::Normal
    } else if percent < 40.0 {
        ConditionSeverity::Mild
    } else if percent < 60.0 {
        ConditionSeverity::Moderate
    } else {
        ConditionSeverity::Severe
    }
}

// Healthy colour sits in a band, so both ends are flagged.
fn redness_severity(percent: f32) -> ConditionSeverity {
    if percent < 60.0 {
        ConditionSeverity::Mild
    } else if percent < 70.0 {
        ConditionSeverity::Moderate
    } else if percent < 85.0 {
        ConditionSeverity::Normal
    } else {
        ConditionSeverity::Severe
    }
}

fn concern_if(flag: bool) -> String {
    let status = if flag { "Concern" } else { "Normal" };
    status.to_string()
}

/// Conditions in display order: white coating, jaggedness, cracks, redness
pub fn assess(record: &AnalysisRecord) -> Vec<ConditionResult> {
    let scores = Scores::of(record);
    let coating_severity = coating_severity(scores.coating);
    let coating_status = record
        .white_coating
        .as_ref()
        .and_then(|c| c.severity.clone())
        .unwrap_or_else(|| coating_severity.to_string());

    vec![
        ConditionResult {
            name: "White Coating",
            description: format!("White coating present: {}%", scores.coating as i32),
            status: coating_status,
            confidence: scores.coating / 100.0,
            severity: coating_severity,
        },
        ConditionResult {
            name: "Jaggedness",
            description: format!("Edge irregularity: {}%", scores.jaggedness as i32),
            status: concern_if(scores.jaggedness > 30.0),
            confidence: scores.jaggedness / 100.0,
            severity: surface_severity(scores.jaggedness),
        },
        ConditionResult {
            name: "Cracks",
            description: format!("Surface cracks detected: {}%", scores.cracks as i32),
            status: concern_if(scores.cracks > 30.0),
            confidence: scores.cracks / 100.0,
            severity: surface_severity(scores.cracks),
        },
        ConditionResult {
            name: "Redness",
            description: format!("Tongue color: {}%", scores.redness as i32),
            status: concern_if(scores.redness > 80.0),
            confidence: scores.redness / 100.0,
            severity: redness_severity(scores.redness),
        },
    ]
}

pub fn recommendations(record: &AnalysisRecord) -> Vec<String> {
    let scores = Scores::of(record);
    let mut out: Vec<&str> = Vec::new();

    if scores.coating > 40.0 {
        out.push("Consider reducing intake of dairy products and processed foods");
        out.push("Drink more water to help cleanse the digestive system");
    }
    if scores.jaggedness > 30.0 {
        out.push("Practice stress reduction techniques like meditation or deep breathing");
        out.push("Ensure adequate intake of B vitamins");
    }
    if scores.cracks > 20.0 {
        out.push("Stay hydrated with at least 8 glasses of water daily");
        out.push("Consider adding more moisture-rich foods to your diet");
    }
    if scores.redness > 80.0 || scores.redness < 60.0 {
        out.push("Monitor your diet for foods that may cause irritation");
        out.push("Follow up with a healthcare provider if abnormal color persists");
    }
    out.push("Track your tongue health over time using this app");

    out.into_iter().map(String::from).collect()
}
