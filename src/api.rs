use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, Query as QueryParams, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::config::DashboardConfig;
use crate::fetcher::{CacheStatus, FetcherConfig, TrendsFetcher};
use crate::metrics::Metrics;
use crate::model::{classify_error, FailureKind, FetchResult};
use crate::provider::{DynProvider, TrendingSearch};
use crate::query::{parse_keywords, Query, Timeframe};
use crate::rate_gate::GateDecision;
use crate::session::{
    anon_id, is_valid_session_id, new_session_id, SessionState, SessionStore, SESSION_HEADER,
};
use crate::summary::{summarize, Summary};

pub const CACHE_HEADER: &str = "x-trends-cache";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub sessions: Arc<SessionStore>,
    pub fetcher: TrendsFetcher,
    pub trending: Arc<TtlCache<String, Vec<TrendingSearch>>>,
}

impl AppState {
    pub fn new(config: DashboardConfig, provider: DynProvider) -> Self {
        let fetcher = TrendsFetcher::new(provider, FetcherConfig::from(&config));
        Self {
            sessions: Arc::new(SessionStore::new(config.session_idle_secs)),
            config: Arc::new(config),
            fetcher,
            trending: Arc::new(TtlCache::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut app: Router<AppState> = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/trends", post(fetch_trends))
        .route("/trending", get(trending_now))
        .route("/session", get(session_status));

    if state.config.expose_metrics {
        if let Some(m) = Metrics::init(state.config.cache_ttl_secs, state.config.failure_ttl_secs) {
            app = app.merge(m.router::<AppState>());
        }
    }

    app.layer(CorsLayer::very_permissive()).with_state(state)
}

/// JSON error body with a status code. Only used for malformed requests.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct TrendsReq {
    #[serde(default)]
    terms: Option<Vec<String>>,
    /// Comma-separated free text, remembered for the session.
    #[serde(default)]
    keywords: Option<String>,
    geo: String,
    timeframe: String,
    /// Second region fetched under the same cooldown slot, e.g. the whole country.
    #[serde(default)]
    overview_geo: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeoResult {
    geo: String,
    cache: CacheStatus,
    result: FetchResult,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct TrendsResp {
    terms: Vec<String>,
    timeframe: Timeframe,
    primary: GeoResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    overview: Option<GeoResult>,
}

#[derive(Debug, Serialize)]
struct CooldownResp {
    status: &'static str,
    remaining_secs: u64,
}

/// Session id from the request header, or a fresh one.
fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| is_valid_session_id(id))
        .map(str::to_string)
        .unwrap_or_else(new_session_id)
}

fn with_session_header(mut resp: Response, id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(id) {
        resp.headers_mut().insert(SESSION_HEADER, v);
    }
    resp
}

/// Explicit terms win; then new keyword text; then the session's last entry.
fn resolve_terms(req: &TrendsReq, session: &SessionState) -> anyhow::Result<Vec<String>> {
    if let Some(terms) = &req.terms {
        return Ok(terms.clone());
    }
    if let Some(text) = &req.keywords {
        return Ok(parse_keywords(text));
    }
    session
        .keywords
        .as_deref()
        .map(parse_keywords)
        .ok_or_else(|| anyhow!("no search terms given and none remembered for this session"))
}

fn build_queries(
    req: &TrendsReq,
    terms: Vec<String>,
    max_terms: usize,
) -> anyhow::Result<(Query, Option<Query>)> {
    let timeframe: Timeframe = req.timeframe.parse()?;
    let primary = Query::new(terms, req.geo.as_str(), timeframe, max_terms)?;
    let overview = match req.overview_geo.as_deref().map(str::trim) {
        Some(g) if !g.is_empty() && g != primary.geo() => Some(primary.with_geo(g)?),
        _ => None,
    };
    Ok((primary, overview))
}

/// Validate the request against the session, then consult its gate.
/// Nothing is recorded on the session unless the request is valid.
fn admit(
    req: &TrendsReq,
    session: &mut SessionState,
    cfg: &DashboardConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<((Query, Option<Query>), GateDecision)> {
    let terms = resolve_terms(req, session)?;
    let queries = build_queries(req, terms, cfg.max_terms)?;
    if req.terms.is_none() {
        if let Some(text) = &req.keywords {
            session.keywords = Some(text.clone());
        }
    }
    Ok((queries, session.gate.try_acquire(now, cfg.cooldown_secs)))
}

async fn run_query(fetcher: &TrendsFetcher, query: &Query, now: DateTime<Utc>) -> GeoResult {
    let (result, cache) = fetcher.fetch_traced(query, now).await;
    let summary = result
        .series()
        .map(|s| summarize(s, query.terms()))
        .unwrap_or_default();
    GeoResult {
        geo: query.geo().to_string(),
        cache,
        result,
        summary,
    }
}

async fn fetch_trends(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TrendsReq>, JsonRejection>,
) -> Response {
    let sid = session_id(&headers);
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rej) => {
            let err = ApiError::bad_request(anyhow!(rej.body_text()));
            return with_session_header(err.into_response(), &sid);
        }
    };
    let now = Utc::now();

    // Validate before touching the gate so a bad request never consumes the slot.
    let admitted = state
        .sessions
        .with_session(&sid, now, |s| admit(&req, s, &state.config, now));

    let ((primary, overview), decision) = match admitted {
        Ok(v) => v,
        Err(e) => {
            return with_session_header(ApiError::bad_request(e).into_response(), &sid);
        }
    };

    if let GateDecision::Denied { remaining_secs } = decision {
        counter!("trends_gate_denied_total").increment(1);
        info!(target: "gate", session = %anon_id(&sid), remaining_secs, "fetch denied by cooldown");
        let body = CooldownResp {
            status: "cooldown",
            remaining_secs,
        };
        let mut resp = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        if let Ok(v) = HeaderValue::from_str(&remaining_secs.to_string()) {
            resp.headers_mut().insert(header::RETRY_AFTER, v);
        }
        return with_session_header(resp, &sid);
    }

    info!(
        target: "trends",
        session = %anon_id(&sid),
        key = %primary.cache_key(),
        overview = ?overview.as_ref().map(|q| q.geo()),
        "fetch admitted"
    );

    let primary_res = run_query(&state.fetcher, &primary, now).await;
    let overview_res = match &overview {
        Some(q) => Some(run_query(&state.fetcher, q, Utc::now()).await),
        None => None,
    };

    let cache_header = primary_res.cache.as_header();
    let body = TrendsResp {
        terms: primary.terms().to_vec(),
        timeframe: primary.timeframe(),
        primary: primary_res,
        overview: overview_res,
    };
    let mut resp = Json(body).into_response();
    resp.headers_mut()
        .insert(CACHE_HEADER, HeaderValue::from_static(cache_header));
    with_session_header(resp, &sid)
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum TrendingResp {
    Success {
        country: String,
        items: Vec<TrendingSearch>,
    },
    Failure {
        country: String,
        kind: FailureKind,
        message: String,
    },
}

async fn trending_now(
    State(state): State<AppState>,
    QueryParams(q): QueryParams<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let country = q
        .get("country")
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request(anyhow!("query parameter 'country' is required")))?;

    let now = Utc::now();
    if let Some(items) = state.trending.get(&country, now) {
        let mut resp = Json(TrendingResp::Success { country, items }).into_response();
        resp.headers_mut()
            .insert(CACHE_HEADER, HeaderValue::from_static(CacheStatus::Hit.as_header()));
        return Ok(resp);
    }

    let body = match state.fetcher.provider().trending_now(&country).await {
        Ok(items) => {
            let ttl = ChronoDuration::seconds(state.config.cache_ttl_secs);
            state.trending.insert(country.clone(), items.clone(), now, ttl);
            TrendingResp::Success { country, items }
        }
        Err(e) => {
            let message = format!("{e:#}");
            let kind = classify_error(&message);
            warn!(target: "trends", %country, kind = kind.as_str(), error = %message, "trending searches failed");
            TrendingResp::Failure {
                country,
                kind,
                message,
            }
        }
    };
    let mut resp = Json(body).into_response();
    resp.headers_mut()
        .insert(CACHE_HEADER, HeaderValue::from_static(CacheStatus::Miss.as_header()));
    Ok(resp)
}

#[derive(Debug, Serialize)]
struct SessionResp {
    cooldown_secs: i64,
    remaining_secs: u64,
    last_accepted_at: Option<DateTime<Utc>>,
    keywords: Option<String>,
}

async fn session_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let sid = session_id(&headers);
    let now = Utc::now();
    let cooldown = state.config.cooldown_secs;
    let snap = state.sessions.snapshot(&sid);
    let body = SessionResp {
        cooldown_secs: cooldown,
        remaining_secs: snap
            .as_ref()
            .map(|s| s.gate.remaining(now, cooldown))
            .unwrap_or(0),
        last_accepted_at: snap.as_ref().and_then(|s| s.gate.last_accepted_at()),
        keywords: snap.and_then(|s| s.keywords),
    };
    with_session_header(Json(body).into_response(), &sid)
}
