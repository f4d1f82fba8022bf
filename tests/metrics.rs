// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

// Build full in-process app the way the binary does (config file + env).
async fn build_app() -> Router {
    std::env::set_var("TRENDS_PROVIDER", "mock");
    std::env::set_var("TRENDS_RELATED_DELAY_MS", "0");
    std::env::set_var("TRENDS_COOLDOWN_SECS", "0");
    std::env::set_var("TRENDS_EXPOSE_METRICS", "1");
    trends_dashboard::app()
        .await
        .expect("app() should build Router in tests")
}

fn same_payload() -> &'static str {
    r#"{"terms":["metrics A","metrics B"],"geo":"XX","timeframe":"today 1-m"}"#
}

#[tokio::test]
async fn cache_miss_then_hit_shows_up_in_exposition() {
    let app = build_app().await;

    for _ in 0..2 {
        let r = app
            .clone()
            .oneshot(
                Request::post("/trends")
                    .header("content-type", "application/json")
                    .body(Body::from(same_payload()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(r.status(), StatusCode::OK);
    }

    let m = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(m.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(m.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "trends_cache_hits_total",
        "trends_cache_misses_total",
        "trends_provider_calls_total",
        "trends_fetch_duration_ms",
        "trends_cache_ttl_secs",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
