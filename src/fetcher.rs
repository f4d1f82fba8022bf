//! # Trends fetcher
//! Cached, failure-classifying facade over a `TrendsProvider`.
//!
//! Per miss: interest over time → (pacing delay) → related queries, then the
//! outcome is stored under an order-insensitive key. Provider errors never
//! escape; they become `FetchResult::Failure`. A failing related-queries call
//! keeps the series and records the error instead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::{counter, histogram};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::config::DashboardConfig;
use crate::model::{FetchResult, RelatedMap, Series};
use crate::provider::DynProvider;
use crate::query::{CacheKey, Query};

/// Result store shared by every session of the process.
pub type ResultCache = TtlCache<CacheKey, FetchResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Value for the `X-Trends-Cache` header.
    pub fn as_header(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub ttl: ChronoDuration,
    pub failure_ttl: ChronoDuration,
    /// Inclusive range for the pacing delay before the related-queries call.
    pub related_delay_ms: (u64, u64),
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

impl From<&DashboardConfig> for FetcherConfig {
    fn from(cfg: &DashboardConfig) -> Self {
        Self {
            ttl: ChronoDuration::seconds(cfg.cache_ttl_secs),
            failure_ttl: ChronoDuration::seconds(cfg.failure_ttl_secs),
            related_delay_ms: (cfg.related_delay_min_ms, cfg.related_delay_max_ms),
        }
    }
}

#[derive(Clone)]
pub struct TrendsFetcher {
    provider: DynProvider,
    cache: Arc<ResultCache>,
    cfg: FetcherConfig,
}

impl TrendsFetcher {
    pub fn new(provider: DynProvider, cfg: FetcherConfig) -> Self {
        Self::with_cache(provider, Arc::new(ResultCache::new()), cfg)
    }

    /// Use an existing cache, e.g. one shared with another fetcher.
    pub fn with_cache(provider: DynProvider, cache: Arc<ResultCache>, cfg: FetcherConfig) -> Self {
        Self {
            provider,
            cache,
            cfg,
        }
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.cfg
    }

    pub async fn fetch(&self, query: &Query, now: DateTime<Utc>) -> FetchResult {
        self.fetch_traced(query, now).await.0
    }

    /// Like `fetch`, also reporting whether the cache answered.
    pub async fn fetch_traced(&self, query: &Query, now: DateTime<Utc>) -> (FetchResult, CacheStatus) {
        let key = query.cache_key();
        if let Some(hit) = self.cache.get(&key, now) {
            counter!("trends_cache_hits_total").increment(1);
            debug!(target: "trends", %key, "cache hit");
            return (hit, CacheStatus::Hit);
        }
        counter!("trends_cache_misses_total").increment(1);

        let t0 = Instant::now();
        let result = self.fetch_remote(query).await;
        histogram!("trends_fetch_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let ttl = if result.is_success() {
            self.cfg.ttl
        } else {
            self.cfg.failure_ttl
        };
        self.cache.insert(key, result.clone(), now, ttl);
        (result, CacheStatus::Miss)
    }

    async fn fetch_remote(&self, query: &Query) -> FetchResult {
        let (terms, geo, tf) = (query.terms(), query.geo(), query.timeframe());

        counter!("trends_provider_calls_total", "op" => "interest_over_time").increment(1);
        let frame = match self.provider.interest_over_time(terms, geo, tf).await {
            Ok(f) => f,
            Err(e) => return failed("interest_over_time", query, &e),
        };
        if frame.is_empty() {
            info!(target: "trends", key = %query.cache_key(), "provider returned no data");
            return FetchResult::empty();
        }
        let series = Series::from_frame(frame);

        if tf.is_hourly() {
            return FetchResult::Success {
                series,
                related: RelatedMap::new(),
                related_error: None,
            };
        }

        let delay = pick_delay_ms(self.cfg.related_delay_ms);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        counter!("trends_provider_calls_total", "op" => "related_queries").increment(1);
        match self.provider.related_queries(terms, geo, tf).await {
            Ok(mut found) => {
                let related = terms.iter().map(|t| (t.clone(), found.remove(t))).collect();
                FetchResult::Success {
                    series,
                    related,
                    related_error: None,
                }
            }
            Err(e) => {
                let message = format!("{e:#}");
                warn!(
                    target: "trends",
                    key = %query.cache_key(),
                    error = %message,
                    "related queries failed; keeping series"
                );
                counter!("trends_related_degraded_total").increment(1);
                FetchResult::Success {
                    series,
                    related: RelatedMap::new(),
                    related_error: Some(message),
                }
            }
        }
    }
}

fn failed(op: &'static str, query: &Query, err: &anyhow::Error) -> FetchResult {
    let result = FetchResult::failure(format!("{err:#}"));
    if let FetchResult::Failure { kind, message } = &result {
        warn!(
            target: "trends",
            op,
            key = %query.cache_key(),
            kind = kind.as_str(),
            error = %message,
            "provider call failed"
        );
        counter!("trends_failures_total", "kind" => kind.as_str()).increment(1);
    }
    result
}

fn pick_delay_ms((min, max): (u64, u64)) -> u64 {
    if max > min {
        rand::rng().random_range(min..=max)
    } else {
        min
    }
}
