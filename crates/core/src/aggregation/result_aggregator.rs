use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::sighting::Sighting;

/// One identity in the final report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub name: String,
    /// Match confidence as a percentage, two decimals.
    #[serde(rename = "confidence")]
    pub confidence_percent: f64,
    /// Seconds into the video, two decimals.
    pub first_seen_sec: f64,
}

/// Report rows ordered by first appearance.
pub type ProcessingResult = Vec<ReportRow>;

/// Keeps the first sighting of each identity.
///
/// Later sightings of an already-seen name are discarded even when their
/// confidence is higher.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    first_seen: HashMap<String, Sighting>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when this is the first sighting of `sighting.name`.
    pub fn record(&mut self, sighting: Sighting) -> bool {
        if self.first_seen.contains_key(&sighting.name) {
            return false;
        }
        self.first_seen.insert(sighting.name.clone(), sighting);
        true
    }

    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }

    /// Report rows ordered by first appearance, then name.
    pub fn finish(self) -> ProcessingResult {
        let mut rows: Vec<ReportRow> = self
            .first_seen
            .into_values()
            .map(|s| ReportRow {
                name: s.name,
                confidence_percent: round2(s.confidence * 100.0),
                first_seen_sec: round2(s.timestamp),
            })
            .collect();
        rows.sort_by(|a, b| {
            a.first_seen_sec
                .total_cmp(&b.first_seen_sec)
                .then_with(|| a.name.cmp(&b.name))
        });
        rows
    }
}

/// Two decimals, halves to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sighting(name: &str, confidence: f64, timestamp: f64) -> Sighting {
        Sighting {
            name: name.to_string(),
            confidence,
            timestamp,
            frame_index: (timestamp * 30.0) as usize,
        }
    }

    #[test]
    fn test_first_sighting_wins() {
        let mut agg = ResultAggregator::new();
        assert!(agg.record(sighting("ada", 0.7, 1.0)));
        assert!(!agg.record(sighting("ada", 0.99, 2.0)));
        assert_eq!(agg.len(), 1);

        let rows = agg.finish();
        assert_eq!(
            rows,
            vec![ReportRow {
                name: "ada".to_string(),
                confidence_percent: 70.0,
                first_seen_sec: 1.0,
            }]
        );
    }

    #[test]
    fn test_rows_sorted_by_first_seen_without_duplicates() {
        let mut agg = ResultAggregator::new();
        for s in [
            sighting("cy", 0.8, 4.0),
            sighting("ada", 0.8, 2.0),
            sighting("bob", 0.8, 0.5),
            sighting("ada", 0.9, 5.0),
            sighting("bob", 0.9, 6.0),
        ] {
            agg.record(s);
        }
        let rows = agg.finish();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "ada", "cy"]);
        assert!(rows.windows(2).all(|w| w[0].first_seen_sec <= w[1].first_seen_sec));
    }

    #[test]
    fn test_equal_timestamps_ordered_by_name() {
        let mut agg = ResultAggregator::new();
        agg.record(sighting("zoe", 0.8, 1.001));
        agg.record(sighting("amy", 0.8, 1.0));
        let names: Vec<String> = agg.finish().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["amy", "zoe"]);
    }

    #[test]
    fn test_empty_aggregator_yields_no_rows() {
        let agg = ResultAggregator::new();
        assert!(agg.is_empty());
        assert!(agg.finish().is_empty());
    }

    #[test]
    fn test_values_rounded_to_two_decimals() {
        let mut agg = ResultAggregator::new();
        agg.record(sighting("ada", 0.876543, 1.0 / 3.0));
        let row = &agg.finish()[0];
        assert_eq!(row.confidence_percent, 87.65);
        assert_eq!(row.first_seen_sec, 0.33);
    }

    #[rstest]
    #[case(95.0, 95.0)]
    #[case(12.344, 12.34)]
    #[case(12.346, 12.35)]
    #[case(0.0, 0.0)]
    #[case(0.125, 0.12)]
    #[case(0.375, 0.38)]
    #[case(0.625, 0.62)]
    fn test_round2(#[case] input: f64, #[case] expected: f64) {
        assert_eq!(round2(input), expected);
    }

    #[test]
    fn test_half_frame_timestamp_rounds_to_even() {
        // Frame 3 at 24 fps.
        let mut agg = ResultAggregator::new();
        agg.record(sighting("ada", 0.8, 3.0 / 24.0));
        assert_eq!(agg.finish()[0].first_seen_sec, 0.12);
    }

    #[test]
    fn test_report_row_serializes_as_confidence() {
        let row = ReportRow {
            name: "ada".to_string(),
            confidence_percent: 95.0,
            first_seen_sec: 0.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "ada", "confidence": 95.0, "first_seen_sec": 0.0})
        );
    }
}
