// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Read-side views over stored analysis history

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::assessment::parse_score;
use crate::models::{AnalysisHistory, AnalysisRecord, Profile, TIMESTAMP_FORMAT};

/// One analysis in the combined history of all profiles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    pub profile: String,
    pub age: String,
    pub gender: String,
    /// `"{name}-{timestamp}"`
    pub id: String,
    pub timestamp: String,
    /// Date part of the timestamp
    pub date: String,
    pub analysis: AnalysisRecord,
}

/// Flatten every profile's history into one list, newest first
///
/// Entries with identical timestamps keep the order of `profiles`.
pub fn project_all(profiles: &[Profile]) -> Vec<HistoryItem> {
    let mut items: Vec<HistoryItem> = profiles
        .iter()
        .flat_map(|profile| {
            profile.history.iter().map(move |(timestamp, analysis)| HistoryItem {
                profile: profile.name.clone(),
                age: profile.age.clone(),
                gender: profile.gender.clone(),
                id: format!("{}-{}", profile.name, timestamp),
                timestamp: timestamp.clone(),
                date: timestamp
                    .split(' ')
                    .next()
                    .filter(|d| !d.is_empty())
                    .unwrap_or("Unknown date")
                    .to_string(),
                analysis: analysis.clone(),
            })
        })
        .collect();

    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items
}

/// One profile's analyses, newest first
pub fn timeline(profile: &Profile) -> Vec<(&str, &AnalysisRecord)> {
    profile
        .history
        .iter()
        .rev()
        .map(|(timestamp, analysis)| (timestamp.as_str(), analysis))
        .collect()
}

/// Per-metric series of one profile's history in chronological order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSeries {
    pub dates: Vec<String>,
    /// `MM/dd` labels
    pub short_dates: Vec<String>,
    pub nutrition_scores: Vec<f32>,
    pub mantle_scores: Vec<f32>,
    /// Redness scaled by 10 to share an axis with the percentages
    pub redness_values: Vec<f32>,
    pub coating_percentages: Vec<f32>,
}

pub fn trend_series(history: &AnalysisHistory) -> TrendSeries {
    let mut series = TrendSeries::default();

    for (timestamp, analysis) in history {
        series.dates.push(timestamp.clone());
        series.short_dates.push(short_date(timestamp));
        series.nutrition_scores.push(parse_score(analysis.nutrition_score.as_deref()));
        series.mantle_scores.push(parse_score(analysis.mantle_score.as_deref()));
        series.redness_values.push(parse_score(analysis.redness.as_deref()) * 10.0);
        series.coating_percentages.push(
            analysis
                .white_coating
                .as_ref()
                .and_then(|c| c.white_coating_percentage)
                .unwrap_or(0.0) as f32,
        );
    }

    series
}

fn short_date(timestamp: &str) -> String {
    match NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT) {
        Ok(at) => at.format("%m/%d").to_string(),
        Err(_) => timestamp.chars().take(5).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WhiteCoating;

    fn with_entries(name: &str, stamps: &[&str]) -> Profile {
        let mut profile = Profile::new(name, "30", "Other");
        for stamp in stamps {
            profile.history.insert(stamp.to_string(), AnalysisRecord::default());
        }
        profile
    }

    #[test]
    fn newest_first_across_profiles() {
        let profiles = vec![
            with_entries("A", &["2024-01-01 10:00:00"]),
            with_entries("B", &["2024-01-02 09:00:00"]),
        ];
        let items = project_all(&profiles);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["B-2024-01-02 09:00:00", "A-2024-01-01 10:00:00"]);
        assert_eq!(items[0].date, "2024-01-02");
    }

    #[test]
    fn interleaves_entries_of_many_profiles() {
        let profiles = vec![
            with_entries("A", &["2024-01-01 10:00:00", "2024-03-01 10:00:00"]),
            with_entries("B", &["2024-02-01 10:00:00"]),
        ];
        let stamps: Vec<String> = project_all(&profiles).into_iter().map(|i| i.timestamp).collect();
        assert_eq!(
            stamps,
            vec!["2024-03-01 10:00:00", "2024-02-01 10:00:00", "2024-01-01 10:00:00"]
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let profiles = vec![
            with_entries("First", &["2024-05-05 05:05:05"]),
            with_entries("Second", &["2024-05-05 05:05:05"]),
            with_entries("Third", &["2024-05-05 05:05:05"]),
        ];
        let names: Vec<String> = project_all(&profiles).into_iter().map(|i| i.profile).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn projection_is_repeatable() {
        let profiles = vec![
            with_entries("A", &["2024-01-01 10:00:00", "2024-01-01 10:00:00x"]),
            with_entries("B", &["2024-01-01 10:00:00", "2023-06-01 00:00:00"]),
        ];
        assert_eq!(project_all(&profiles), project_all(&profiles));
    }

    #[test]
    fn empty_inputs() {
        assert!(project_all(&[]).is_empty());
        assert!(project_all(&[Profile::new("A", "1", "Male")]).is_empty());
    }

    #[test]
    fn odd_keys_get_a_date_fallback() {
        let items = project_all(&[with_entries("A", &[" 10:00"])]);
        assert_eq!(items[0].date, "Unknown date");
    }

    #[test]
    fn timeline_is_newest_first() {
        let profile = with_entries("A", &["2024-01-02 00:00:00", "2024-01-01 00:00:00", "2024-01-03 00:00:00"]);
        let stamps: Vec<&str> = timeline(&profile).into_iter().map(|(t, _)| t).collect();
        assert_eq!(stamps, vec!["2024-01-03 00:00:00", "2024-01-02 00:00:00", "2024-01-01 00:00:00"]);
    }

    #[test]
    fn trend_series_is_chronological_with_defaults() {
        let mut history = AnalysisHistory::new();
        history.insert(
            "2024-02-10 08:00:00".to_string(),
            AnalysisRecord {
                nutrition_score: Some("7.5".to_string()),
                mantle_score: Some("bad".to_string()),
                redness: Some("6.5".to_string()),
                white_coating: Some(WhiteCoating {
                    white_coating_percentage: Some(41.0),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        history.insert("2024-01-05 08:00:00".to_string(), AnalysisRecord::default());
        history.insert("legacy-key".to_string(), AnalysisRecord::default());

        let series = trend_series(&history);
        assert_eq!(series.short_dates, vec!["01/05", "02/10", "legac"]);
        assert_eq!(series.nutrition_scores, vec![0.0, 7.5, 0.0]);
        assert_eq!(series.mantle_scores, vec![0.0, 0.0, 0.0]);
        assert_eq!(series.redness_values[1], 65.0);
        assert_eq!(series.coating_percentages, vec![0.0, 41.0, 0.0]);
    }
}
