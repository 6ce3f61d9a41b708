// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tongue_tracker::assessment::{assess, parse_score, recommendations};
use tongue_tracker::history::trend_series;
use tongue_tracker::models::{AnalysisHistory, AnalysisRecord};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    payload: &'a [u8],
    score: &'a str,
    timestamp: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let score = parse_score(Some(input.score));
    assert!(score.is_finite());

    let Ok(record) = serde_json::from_slice::<AnalysisRecord>(input.payload) else {
        return;
    };

    assert_eq!(assess(&record).len(), 4);
    assert!(!recommendations(&record).is_empty());

    // Whatever decoded must survive a store round trip unchanged.
    let encoded = serde_json::to_string(&record).unwrap();
    let decoded: AnalysisRecord = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, record);

    let mut history = AnalysisHistory::new();
    history.insert(input.timestamp.to_string(), record);
    assert_eq!(trend_series(&history).short_dates.len(), 1);
});
