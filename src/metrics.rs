use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::warn;

/// Process-wide recorder; installing twice fails, so the handle is kept here.
static HANDLE: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once, describe series, and publish the TTL gauges.
    /// Returns `None` when another recorder already owns the process.
    pub fn init(ttl_secs: i64, failure_ttl_secs: i64) -> Option<Self> {
        let handle = HANDLE
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(h) => {
                    describe();
                    Some(h)
                }
                Err(e) => {
                    warn!(error = %e, "prometheus recorder not installed");
                    None
                }
            })
            .clone()?;

        // absolute TTLs, no sliding refresh
        gauge!("trends_cache_ttl_secs").set(ttl_secs as f64);
        gauge!("trends_failure_ttl_secs").set(failure_ttl_secs as f64);

        Some(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("trends_cache_hits_total", "Fetches answered from the result cache.");
    describe_counter!(
        "trends_cache_misses_total",
        "Fetches that had to call the provider."
    );
    describe_counter!(
        "trends_provider_calls_total",
        "Provider operations started by the fetcher."
    );
    describe_counter!(
        "trends_provider_requests_total",
        "HTTP requests sent to the provider, retries included."
    );
    describe_counter!("trends_failures_total", "Failed fetches by failure kind.");
    describe_counter!(
        "trends_related_degraded_total",
        "Fetches whose related-queries call failed but series was kept."
    );
    describe_counter!(
        "trends_gate_denied_total",
        "Requests rejected by the session cooldown."
    );
    describe_histogram!(
        "trends_fetch_duration_ms",
        "Wall time of cache-miss fetches in milliseconds."
    );
    describe_gauge!("trends_cache_ttl_secs", "TTL of successful results.");
    describe_gauge!("trends_failure_ttl_secs", "TTL of failed results.");
    describe_gauge!("trends_active_sessions", "Sessions currently tracked.");
}
