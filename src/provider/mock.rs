//! Deterministic in-process provider for tests and local runs.
//!
//! Series values are derived from the term text, so identical queries always
//! produce identical data. Behaviour can be scripted per call family.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};

use super::types::{
    FrameRow, InterestFrame, RankedPhrase, RelatedQueries, TrendingSearch, TrendsProvider,
    PARTIAL_MARKER_COLUMN,
};
use crate::query::Timeframe;

const POINTS: i64 = 8;

#[derive(Debug, Clone, Default)]
struct Script {
    series_error: Option<String>,
    related_error: Option<String>,
    empty_series: bool,
    declined_terms: Vec<String>,
}

/// Counters are shared across clones so a test can keep a handle after
/// moving the provider into a fetcher.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    script: Arc<Mutex<Script>>,
    series_calls: Arc<AtomicUsize>,
    related_calls: Arc<AtomicUsize>,
    trending_calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every interest-over-time call fails with `msg`.
    pub fn failing_series(self, msg: &str) -> Self {
        self.edit(|s| s.series_error = Some(msg.to_string()));
        self
    }

    /// Every related-queries call fails with `msg`.
    pub fn failing_related(self, msg: &str) -> Self {
        self.edit(|s| s.related_error = Some(msg.to_string()));
        self
    }

    /// Interest-over-time returns no rows.
    pub fn empty_series(self) -> Self {
        self.edit(|s| s.empty_series = true);
        self
    }

    /// Related queries leave `term` out, as the provider does when it has no data.
    pub fn declining(self, term: &str) -> Self {
        self.edit(|s| s.declined_terms.push(term.to_string()));
        self
    }

    /// Reset scripted failures (counters are kept).
    pub fn recover(&self) {
        self.edit(|s| {
            s.series_error = None;
            s.related_error = None;
        });
    }

    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }

    pub fn related_calls(&self) -> usize {
        self.related_calls.load(Ordering::SeqCst)
    }

    pub fn trending_calls(&self) -> usize {
        self.trending_calls.load(Ordering::SeqCst)
    }

    fn edit(&self, f: impl FnOnce(&mut Script)) {
        let mut g = self.script.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut g);
    }

    fn script(&self) -> Script {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

/// Stable pseudo-score in [0,100] for a term at a row index.
fn score_for(term: &str, idx: i64) -> f64 {
    let seed: i64 = term.bytes().map(i64::from).sum();
    ((seed * 7 + idx * 13) % 101) as f64
}

#[async_trait::async_trait]
impl TrendsProvider for MockProvider {
    async fn interest_over_time(
        &self,
        terms: &[String],
        _geo: &str,
        timeframe: Timeframe,
    ) -> Result<InterestFrame> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script();
        if let Some(msg) = script.series_error {
            return Err(anyhow!(msg));
        }
        if script.empty_series {
            return Ok(InterestFrame::default());
        }

        let step = if timeframe.is_hourly() {
            ChronoDuration::minutes(8)
        } else {
            ChronoDuration::days(1)
        };
        let start = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| anyhow!("mock start time"))?;

        let mut columns: Vec<String> = terms.to_vec();
        columns.push(PARTIAL_MARKER_COLUMN.to_string());
        let rows = (0..POINTS)
            .map(|i| {
                let mut values: Vec<f64> = terms.iter().map(|t| score_for(t, i)).collect();
                values.push(if i == POINTS - 1 { 1.0 } else { 0.0 });
                FrameRow {
                    at: start + step * i as i32,
                    values,
                }
            })
            .collect();
        Ok(InterestFrame { columns, rows })
    }

    async fn related_queries(
        &self,
        terms: &[String],
        _geo: &str,
        _timeframe: Timeframe,
    ) -> Result<HashMap<String, RelatedQueries>> {
        self.related_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script();
        if let Some(msg) = script.related_error {
            return Err(anyhow!(msg));
        }
        let out = terms
            .iter()
            .filter(|t| !script.declined_terms.contains(t))
            .map(|t| {
                let top = (1..=3)
                    .map(|i| RankedPhrase {
                        query: format!("{t} top {i}"),
                        value: (100 - (i - 1) * 20) as f64,
                    })
                    .collect();
                let related = RelatedQueries {
                    rising: Some(vec![RankedPhrase {
                        query: format!("{t} rising"),
                        value: 250.0,
                    }]),
                    top: Some(top),
                };
                (t.clone(), related)
            })
            .collect();
        Ok(out)
    }

    async fn trending_now(&self, country: &str) -> Result<Vec<TrendingSearch>> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=3)
            .map(|i| TrendingSearch {
                title: format!("{country} trending {i}"),
                published_at: None,
                url: None,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn series_is_deterministic_and_marks_last_row_partial() {
        let p = MockProvider::new();
        let terms = vec!["A".to_string(), "B".to_string()];
        let a = p
            .interest_over_time(&terms, "XX", Timeframe::PastMonth)
            .await
            .unwrap();
        let b = p
            .interest_over_time(&terms, "XX", Timeframe::PastMonth)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.columns.last().map(String::as_str), Some(PARTIAL_MARKER_COLUMN));
        assert_eq!(a.rows.last().unwrap().values[2], 1.0);
        assert_eq!(p.series_calls(), 2);
    }

    #[tokio::test]
    async fn declined_terms_are_left_out() {
        let p = MockProvider::new().declining("B");
        let terms = vec!["A".to_string(), "B".to_string()];
        let rel = p
            .related_queries(&terms, "XX", Timeframe::PastMonth)
            .await
            .unwrap();
        assert!(rel.contains_key("A"));
        assert!(!rel.contains_key("B"));
    }
}
