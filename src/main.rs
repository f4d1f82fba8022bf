//! Trends Dashboard: binary entrypoint
//! Boots the Axum HTTP server with config, provider, session store and cache.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trends=info,gate=info,trends_dashboard=info,warn"));

    // The runtime may already own the global subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = trends_dashboard::app()
        .await
        .map_err(shuttle_runtime::Error::Custom)?;

    Ok(router.into())
}
