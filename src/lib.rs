// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod query;
pub mod rate_gate;
pub mod session;
pub mod summary;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::fetcher::{CacheStatus, TrendsFetcher};
pub use crate::model::{FailureKind, FetchResult};
pub use crate::query::{Query, Timeframe};
pub use crate::rate_gate::{GateDecision, RateGate};

use tracing::info;

/// Build the full in-process app: config from file + env, provider, router.
pub async fn app() -> anyhow::Result<axum::Router> {
    let cfg = config::DashboardConfig::load()?;
    let provider = provider::build_provider(&cfg)?;
    info!(
        cooldown_secs = cfg.cooldown_secs,
        cache_ttl_secs = cfg.cache_ttl_secs,
        failure_ttl_secs = cfg.failure_ttl_secs,
        max_terms = cfg.max_terms,
        "dashboard config loaded"
    );
    Ok(router(AppState::new(cfg, provider)))
}
