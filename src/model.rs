//! # Fetch results
//! Tagged outcome of one query, plus the failure taxonomy and its classifier.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::provider::{InterestFrame, RelatedQueries, PARTIAL_MARKER_COLUMN};

/// One timestamped row: term → interest score in [0,100].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub at: DateTime<Utc>,
    pub scores: BTreeMap<String, f64>,
}

/// Chronological series. Timestamps are strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series(Vec<SeriesPoint>);

impl Series {
    /// Build from a provider frame: drops the partial-period marker column,
    /// clamps scores to [0,100], sorts by time and keeps the last row of any
    /// duplicated timestamp.
    pub fn from_frame(frame: InterestFrame) -> Self {
        let keep: Vec<(usize, String)> = frame
            .columns
            .into_iter()
            .enumerate()
            .filter(|(_, c)| c != PARTIAL_MARKER_COLUMN)
            .collect();

        let mut by_time: BTreeMap<DateTime<Utc>, BTreeMap<String, f64>> = BTreeMap::new();
        for row in frame.rows {
            let scores = keep
                .iter()
                .filter_map(|(i, name)| {
                    row.values
                        .get(*i)
                        .map(|v| (name.clone(), v.clamp(0.0, 100.0)))
                })
                .collect();
            by_time.insert(row.at, scores);
        }

        Series(
            by_time
                .into_iter()
                .map(|(at, scores)| SeriesPoint { at, scores })
                .collect(),
        )
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Related suggestions per query term. `None` = the provider had nothing for that term.
pub type RelatedMap = BTreeMap<String, Option<RelatedQueries>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Provider rate limit hit.
    QuotaExceeded,
    /// Anything else: network, timeout, malformed response.
    ProviderError,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::QuotaExceeded => "quota_exceeded",
            FailureKind::ProviderError => "provider_error",
        }
    }
}

static QUOTA_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b429\b|too many requests").expect("quota marker regex"));

/// Classify a provider error message.
pub fn classify_error(message: &str) -> FailureKind {
    if QUOTA_MARKER.is_match(message) {
        FailureKind::QuotaExceeded
    } else {
        FailureKind::ProviderError
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchResult {
    Success {
        series: Series,
        related: RelatedMap,
        /// Set when the related-queries call failed but the series was kept.
        #[serde(skip_serializing_if = "Option::is_none")]
        related_error: Option<String>,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl FetchResult {
    pub fn empty() -> Self {
        FetchResult::Success {
            series: Series::default(),
            related: RelatedMap::new(),
            related_error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        FetchResult::Failure {
            kind: classify_error(&message),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    pub fn series(&self) -> Option<&Series> {
        match self {
            FetchResult::Success { series, .. } => Some(series),
            FetchResult::Failure { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FrameRow;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn classification_detects_quota_markers() {
        assert_eq!(
            classify_error("multiline: provider returned HTTP 429 Too Many Requests"),
            FailureKind::QuotaExceeded
        );
        assert_eq!(classify_error("The request failed: 429"), FailureKind::QuotaExceeded);
        assert_eq!(classify_error("too many requests"), FailureKind::QuotaExceeded);
        assert_eq!(classify_error("Timeout after 25s"), FailureKind::ProviderError);
        assert_eq!(classify_error("error 14290 in parser"), FailureKind::ProviderError);
    }

    #[test]
    fn series_drops_partial_column_sorts_and_dedups() {
        let frame = InterestFrame {
            columns: vec!["A".into(), "B".into(), PARTIAL_MARKER_COLUMN.into()],
            rows: vec![
                FrameRow { at: at(200), values: vec![5.0, 6.0, 1.0] },
                FrameRow { at: at(100), values: vec![1.0, 2.0, 0.0] },
                FrameRow { at: at(200), values: vec![7.0, 150.0, 1.0] },
            ],
        };
        let s = Series::from_frame(frame);
        assert_eq!(s.len(), 2);
        let pts = s.points();
        assert!(pts[0].at < pts[1].at);
        assert!(!pts[0].scores.contains_key(PARTIAL_MARKER_COLUMN));
        assert_eq!(pts[1].scores["A"], 7.0);
        assert_eq!(pts[1].scores["B"], 100.0);
    }

    #[test]
    fn failure_serializes_with_kind() {
        let f = FetchResult::failure("HTTP 429");
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["status"], "failure");
        assert_eq!(v["kind"], "quota_exceeded");

        let ok = serde_json::to_value(FetchResult::empty()).unwrap();
        assert_eq!(ok["status"], "success");
        assert_eq!(ok["series"], serde_json::json!([]));
        assert!(ok.get("related_error").is_none());
    }
}
