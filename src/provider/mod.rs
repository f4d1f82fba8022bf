// src/provider/mod.rs
pub mod google;
pub mod mock;
pub mod types;

use std::sync::Arc;

use tracing::info;

pub use google::GoogleTrendsProvider;
pub use mock::MockProvider;
pub use types::{
    FrameRow, InterestFrame, RankedPhrase, RelatedQueries, TrendingSearch, TrendsProvider,
    PARTIAL_MARKER_COLUMN,
};

use crate::config::{DashboardConfig, ProviderKind};

/// Shared provider handle used by the fetcher and handlers.
pub type DynProvider = Arc<dyn TrendsProvider>;

/// Factory: build the configured provider.
///
/// * `ProviderKind::Mock` returns the deterministic in-process provider.
/// * `ProviderKind::Google` builds the HTTP client with the configured retry/timeout policy.
pub fn build_provider(cfg: &DashboardConfig) -> anyhow::Result<DynProvider> {
    let provider: DynProvider = match cfg.provider.kind {
        ProviderKind::Mock => Arc::new(MockProvider::new()),
        ProviderKind::Google => Arc::new(GoogleTrendsProvider::new(cfg.provider.clone())?),
    };
    info!(target: "trends", provider = provider.name(), "provider ready");
    Ok(provider)
}
