//! # Query
//! The `(terms, geo, timeframe)` tuple that identifies one search-interest request,
//! plus the cache key derived from it and free-text keyword parsing.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

/// Provider-enforced upper bound on terms per request.
pub const DEFAULT_MAX_TERMS: usize = 5;

/// Time window tokens accepted by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "now 1-H")]
    PastHour,
    #[serde(rename = "now 4-H")]
    PastFourHours,
    #[serde(rename = "now 1-d")]
    PastDay,
    #[serde(rename = "now 7-d")]
    PastWeek,
    #[serde(rename = "today 1-m")]
    PastMonth,
    #[serde(rename = "today 3-m")]
    PastQuarter,
    #[serde(rename = "today 12-m")]
    PastYear,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::PastHour,
        Timeframe::PastFourHours,
        Timeframe::PastDay,
        Timeframe::PastWeek,
        Timeframe::PastMonth,
        Timeframe::PastQuarter,
        Timeframe::PastYear,
    ];

    /// Wire token, e.g. `"today 1-m"`.
    pub fn token(self) -> &'static str {
        match self {
            Timeframe::PastHour => "now 1-H",
            Timeframe::PastFourHours => "now 4-H",
            Timeframe::PastDay => "now 1-d",
            Timeframe::PastWeek => "now 7-d",
            Timeframe::PastMonth => "today 1-m",
            Timeframe::PastQuarter => "today 3-m",
            Timeframe::PastYear => "today 12-m",
        }
    }

    /// Hour-granularity windows. The provider does not serve related queries for these.
    pub fn is_hourly(self) -> bool {
        self.token().ends_with("-H")
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.token() == t)
            .ok_or_else(|| anyhow!("unknown timeframe token '{t}'"))
    }
}

/// Immutable request value. Term order is kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Query {
    terms: Vec<String>,
    geo: String,
    timeframe: Timeframe,
}

impl Query {
    /// Validates terms (1..=`max_terms` distinct, non-blank, trimmed) and a non-empty geo.
    pub fn new(
        terms: Vec<String>,
        geo: impl Into<String>,
        timeframe: Timeframe,
        max_terms: usize,
    ) -> Result<Self> {
        let trimmed: Vec<String> = terms.into_iter().map(|t| t.trim().to_string()).collect();
        if trimmed.is_empty() {
            bail!("at least one search term is required");
        }
        if trimmed.iter().any(|t| t.is_empty()) {
            bail!("search terms must not be blank");
        }
        // first occurrence wins, as for keyword entries
        let mut terms: Vec<String> = Vec::with_capacity(trimmed.len());
        for t in trimmed {
            if !terms.contains(&t) {
                terms.push(t);
            }
        }
        if terms.len() > max_terms {
            bail!(
                "too many search terms: {} given, at most {} allowed",
                terms.len(),
                max_terms
            );
        }
        let geo = geo.into().trim().to_string();
        if geo.is_empty() {
            bail!("region code must not be empty");
        }
        Ok(Self {
            terms,
            geo,
            timeframe,
        })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn geo(&self) -> &str {
        &self.geo
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Same terms and window, different region.
    pub fn with_geo(&self, geo: impl Into<String>) -> Result<Self> {
        Self::new(self.terms.clone(), geo, self.timeframe, self.terms.len())
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from(self)
    }
}

/// Order-insensitive identity of a `Query`: `["A","B"]` and `["B","A"]` share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    terms: Vec<String>,
    geo: String,
    timeframe: Timeframe,
}

impl From<&Query> for CacheKey {
    fn from(q: &Query) -> Self {
        let mut terms = q.terms.clone();
        terms.sort();
        Self {
            terms,
            geo: q.geo.clone(),
            timeframe: q.timeframe,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.terms.join(","), self.geo, self.timeframe)
    }
}

/// Split a comma-separated keyword entry: trim, drop empties, keep the first of duplicates.
pub fn parse_keywords(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let t = raw.trim();
        if t.is_empty() || out.iter().any(|seen| seen == t) {
            continue;
        }
        out.push(t.to_string());
    }
    out
}
