// src/provider/types.rs
use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::Timeframe;

/// Name of the provider's "incomplete period" column in an interest table.
pub const PARTIAL_MARKER_COLUMN: &str = "isPartial";

/// Raw interest-over-time table as the provider returns it: one column per term,
/// possibly followed by the partial-period marker column (1.0 = partial).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterestFrame {
    pub columns: Vec<String>,
    pub rows: Vec<FrameRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameRow {
    pub at: DateTime<Utc>,
    pub values: Vec<f64>,
}

impl InterestFrame {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One entry of a ranked phrase list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPhrase {
    pub query: String,
    pub value: f64,
}

/// Ranked suggestions for one term. `None` means the provider did not supply
/// that list, which is different from an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedQueries {
    pub rising: Option<Vec<RankedPhrase>>,
    pub top: Option<Vec<RankedPhrase>>,
}

/// "Trending searches now" item for a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingSearch {
    pub title: String,
    pub published_at: Option<u64>, // unix seconds
    pub url: Option<String>,
}

/// Remote search-interest source. Implementations own their retry/timeout policy.
#[async_trait::async_trait]
pub trait TrendsProvider: Send + Sync {
    async fn interest_over_time(
        &self,
        terms: &[String],
        geo: &str,
        timeframe: Timeframe,
    ) -> Result<InterestFrame>;

    /// Terms the provider has nothing for are left out of the map.
    async fn related_queries(
        &self,
        terms: &[String],
        geo: &str,
        timeframe: Timeframe,
    ) -> Result<HashMap<String, RelatedQueries>>;

    async fn trending_now(&self, country: &str) -> Result<Vec<TrendingSearch>>;

    fn name(&self) -> &'static str;
}
