//! Google Trends provider over the public web endpoints.
//!
//! Flow per query: `explore` hands out one widget per chart (with a short-lived
//! token), then `widgetdata/multiline` and `widgetdata/relatedsearches` are called
//! with the widget's request + token. Trending searches come from the RSS feed.
//! JSON responses carry an XSSI prefix (`)]}'`) that must be stripped first.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{TimeZone, Utc};
use metrics::counter;
use quick_xml::de::from_str as xml_from_str;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};
use tracing::{debug, warn};

use super::types::{
    FrameRow, InterestFrame, RankedPhrase, RelatedQueries, TrendingSearch, TrendsProvider,
    PARTIAL_MARKER_COLUMN,
};
use crate::config::ProviderConfig;
use crate::query::Timeframe;

const EXPLORE_PATH: &str = "/trends/api/explore";
const MULTILINE_PATH: &str = "/trends/api/widgetdata/multiline";
const RELATED_PATH: &str = "/trends/api/widgetdata/relatedsearches";
const TRENDING_RSS_PATH: &str = "/trending/rss";

const TIMESERIES_WIDGET: &str = "TIMESERIES";
// Explore tokens are short-lived; a handed-out widget set is reused at most once, within this window.
const WIDGET_REUSE_WINDOW: Duration = Duration::from_secs(120);
const RELATED_QUERIES_WIDGET: &str = "RELATED_QUERIES";

#[derive(Debug, Clone, Deserialize)]
struct Widget {
    id: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    request: Value,
}

#[derive(Debug, Deserialize)]
struct ExploreResp {
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct MultilineResp {
    default: MultilineData,
}

#[derive(Debug, Deserialize)]
struct MultilineData {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    time: String,
    #[serde(default)]
    value: Vec<f64>,
    #[serde(rename = "isPartial", default)]
    is_partial: bool,
}

#[derive(Debug, Deserialize)]
struct RelatedResp {
    default: RelatedData,
}

#[derive(Debug, Deserialize)]
struct RelatedData {
    #[serde(rename = "rankedList", default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
struct RankedList {
    #[serde(rename = "rankedKeyword", default)]
    ranked_keyword: Vec<RankedKeyword>,
}

#[derive(Debug, Deserialize)]
struct RankedKeyword {
    query: String,
    #[serde(default)]
    value: f64,
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

type ExploreKey = (Vec<String>, String, Timeframe);

struct ExploredWidgets {
    key: ExploreKey,
    widgets: Vec<Widget>,
    at: Instant,
}

pub struct GoogleTrendsProvider {
    http: Client,
    cfg: ProviderConfig,
    cookies: tokio::sync::OnceCell<()>,
    // Set by a series call, taken by the related call of the same fetch.
    last_explore: Mutex<Option<ExploredWidgets>>,
}

impl GoogleTrendsProvider {
    pub fn new(cfg: ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent("trends-dashboard/0.1")
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building provider http client")?;
        Ok(Self {
            http,
            cfg,
            cookies: tokio::sync::OnceCell::new(),
            last_explore: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    fn tz(&self) -> String {
        self.cfg.tz_offset_minutes.to_string()
    }

    /// The explore endpoint rejects cookie-less clients; visit the home page once.
    async fn ensure_cookies(&self) {
        self.cookies
            .get_or_init(|| async {
                let country = self.cfg.hl.rsplit('-').next().unwrap_or("US").to_string();
                let res = self
                    .http
                    .get(self.url("/"))
                    .query(&[("geo", country.as_str())])
                    .send()
                    .await;
                if let Err(e) = res {
                    warn!(target: "trends", error = %e, "cookie bootstrap failed; continuing without");
                }
            })
            .await;
    }

    async fn send_with_retry<F>(&self, what: &str, build: F) -> Result<String>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            counter!("trends_provider_requests_total").increment(1);
            let reason = match build().send().await {
                Ok(rsp) => {
                    let status = rsp.status();
                    if status.is_success() {
                        return rsp
                            .text()
                            .await
                            .with_context(|| format!("{what}: reading response body"));
                    }
                    if !is_retryable(status) || attempt > self.cfg.retries {
                        bail!("{what}: provider returned HTTP {status}");
                    }
                    format!("HTTP {status}")
                }
                Err(e) => {
                    if attempt > self.cfg.retries {
                        return Err(anyhow!(e).context(format!("{what}: request failed")));
                    }
                    e.to_string()
                }
            };
            let delay = backoff_delay(self.cfg.backoff_factor, attempt);
            warn!(
                target: "trends",
                what,
                attempt,
                %reason,
                delay_ms = delay.as_millis() as u64,
                "provider call failed; retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn explore(&self, terms: &[String], geo: &str, timeframe: Timeframe) -> Result<Vec<Widget>> {
        self.ensure_cookies().await;
        let req = explore_request(terms, geo, timeframe).to_string();
        let tz = self.tz();
        let url = self.url(EXPLORE_PATH);
        let body = self
            .send_with_retry("explore", || {
                self.http.post(&url).query(&[
                    ("hl", self.cfg.hl.as_str()),
                    ("tz", tz.as_str()),
                    ("req", req.as_str()),
                ])
            })
            .await?;
        let resp: ExploreResp = parse_xssi_json(&body).context("parsing explore response")?;
        debug!(target: "trends", widgets = resp.widgets.len(), "explore ok");
        Ok(resp.widgets)
    }

    fn remember_widgets(&self, key: ExploreKey, widgets: Vec<Widget>) {
        let mut g = self.last_explore.lock().unwrap_or_else(|p| p.into_inner());
        *g = Some(ExploredWidgets {
            key,
            widgets,
            at: Instant::now(),
        });
    }

    /// Widgets remembered for `key`, if still fresh. The slot is emptied either way.
    fn take_widgets(&self, key: &ExploreKey) -> Option<Vec<Widget>> {
        let mut g = self.last_explore.lock().unwrap_or_else(|p| p.into_inner());
        g.take()
            .filter(|e| e.key == *key && e.at.elapsed() < WIDGET_REUSE_WINDOW)
            .map(|e| e.widgets)
    }

    fn forget_widgets(&self) {
        let mut g = self.last_explore.lock().unwrap_or_else(|p| p.into_inner());
        *g = None;
    }

    async fn widget_data(&self, what: &str, path: &str, widget: &Widget) -> Result<String> {
        let req = widget.request.to_string();
        let tz = self.tz();
        let url = self.url(path);
        self.send_with_retry(what, || {
            self.http.get(&url).query(&[
                ("hl", self.cfg.hl.as_str()),
                ("tz", tz.as_str()),
                ("req", req.as_str()),
                ("token", widget.token.as_str()),
            ])
        })
        .await
    }
}

#[async_trait::async_trait]
impl TrendsProvider for GoogleTrendsProvider {
    async fn interest_over_time(
        &self,
        terms: &[String],
        geo: &str,
        timeframe: Timeframe,
    ) -> Result<InterestFrame> {
        let widgets = self.explore(terms, geo, timeframe).await?;
        let widget = widgets
            .iter()
            .find(|w| w.id == TIMESERIES_WIDGET)
            .cloned()
            .ok_or_else(|| anyhow!("explore response has no {TIMESERIES_WIDGET} widget"))?;
        self.remember_widgets((terms.to_vec(), geo.to_string(), timeframe), widgets);

        let body = match self.widget_data("multiline", MULTILINE_PATH, &widget).await {
            Ok(b) => b,
            Err(e) => {
                self.forget_widgets();
                return Err(e);
            }
        };
        let resp: MultilineResp = parse_xssi_json(&body).context("parsing multiline response")?;
        timeline_to_frame(terms, resp.default.timeline_data)
    }

    async fn related_queries(
        &self,
        terms: &[String],
        geo: &str,
        timeframe: Timeframe,
    ) -> Result<HashMap<String, RelatedQueries>> {
        let key: ExploreKey = (terms.to_vec(), geo.to_string(), timeframe);
        let widgets = match self.take_widgets(&key) {
            Some(w) => w,
            None => self.explore(terms, geo, timeframe).await?,
        };
        let mut out = HashMap::new();
        for w in widgets
            .iter()
            .filter(|w| w.id.starts_with(RELATED_QUERIES_WIDGET))
        {
            let Some(term) = widget_keyword(w).or_else(|| single_term(terms)) else {
                continue;
            };
            let body = self.widget_data("relatedsearches", RELATED_PATH, w).await?;
            let resp: RelatedResp =
                parse_xssi_json(&body).context("parsing relatedsearches response")?;
            out.insert(term, ranked_to_related(resp.default.ranked_list));
        }
        Ok(out)
    }

    async fn trending_now(&self, country: &str) -> Result<Vec<TrendingSearch>> {
        let url = self.url(TRENDING_RSS_PATH);
        let body = self
            .send_with_retry("trending", || {
                self.http.get(&url).query(&[("geo", country)])
            })
            .await?;
        parse_trending_rss(&body)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 504)
}

/// `factor * 2^(attempt-1)` seconds.
fn backoff_delay(factor: f64, attempt: u8) -> Duration {
    let exp = 2f64.powi(i32::from(attempt.saturating_sub(1)));
    Duration::from_secs_f64((factor * exp).max(0.0))
}

fn explore_request(terms: &[String], geo: &str, timeframe: Timeframe) -> Value {
    let items: Vec<Value> = terms
        .iter()
        .map(|t| json!({ "keyword": t, "time": timeframe.token(), "geo": geo }))
        .collect();
    json!({ "comparisonItem": items, "category": 0, "property": "" })
}

/// Strip the XSSI guard (anything before the first `{`) and parse.
fn parse_xssi_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let start = body
        .find('{')
        .ok_or_else(|| anyhow!("response has no JSON object"))?;
    Ok(serde_json::from_str(&body[start..])?)
}

fn widget_keyword(w: &Widget) -> Option<String> {
    w.request
        .pointer("/restriction/complexKeywordsRestriction/keyword/0/value")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn single_term(terms: &[String]) -> Option<String> {
    match terms {
        [only] => Some(only.clone()),
        _ => None,
    }
}

fn timeline_to_frame(terms: &[String], points: Vec<TimelinePoint>) -> Result<InterestFrame> {
    if points.is_empty() {
        return Ok(InterestFrame::default());
    }
    let mut columns = terms.to_vec();
    columns.push(PARTIAL_MARKER_COLUMN.to_string());

    let mut rows = Vec::with_capacity(points.len());
    for p in points {
        let secs: i64 = p
            .time
            .parse()
            .with_context(|| format!("bad timeline timestamp '{}'", p.time))?;
        let at = Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| anyhow!("timeline timestamp out of range: {secs}"))?;
        if p.value.len() != terms.len() {
            bail!(
                "timeline row has {} values for {} terms",
                p.value.len(),
                terms.len()
            );
        }
        let mut values = p.value;
        values.push(if p.is_partial { 1.0 } else { 0.0 });
        rows.push(FrameRow { at, values });
    }
    Ok(InterestFrame { columns, rows })
}

/// `rankedList[0]` is "top", `rankedList[1]` is "rising".
fn ranked_to_related(lists: Vec<RankedList>) -> RelatedQueries {
    let mut it = lists.into_iter().map(|l| {
        l.ranked_keyword
            .into_iter()
            .map(|k| RankedPhrase {
                query: k.query,
                value: k.value,
            })
            .collect::<Vec<_>>()
    });
    let top = it.next();
    let rising = it.next();
    RelatedQueries { rising, top }
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

fn parse_trending_rss(xml: &str) -> Result<Vec<TrendingSearch>> {
    let rss: Rss = xml_from_str(xml).context("parsing trending rss xml")?;
    let out = rss
        .channel
        .item
        .into_iter()
        .filter_map(|it| {
            let title = html_escape::decode_html_entities(it.title.as_deref()?.trim()).to_string();
            if title.is_empty() {
                return None;
            }
            Some(TrendingSearch {
                title,
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
                url: it.link,
            })
        })
        .collect();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        extract::{Query as QueryParams, State},
        routing::{get, post},
        Router,
    };

    fn terms(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn xssi_prefix_is_stripped() {
        let body = ")]}'\n{\"widgets\":[{\"id\":\"TIMESERIES\",\"token\":\"t1\",\"request\":{}}]}";
        let resp: ExploreResp = parse_xssi_json(body).unwrap();
        assert_eq!(resp.widgets.len(), 1);
        assert_eq!(resp.widgets[0].token, "t1");
        assert!(parse_xssi_json::<ExploreResp>(")]}'").is_err());
    }

    #[test]
    fn explore_request_lists_every_term() {
        let v = explore_request(&terms(&["A", "B"]), "TH-20", Timeframe::PastMonth);
        let items = v["comparisonItem"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["keyword"], "B");
        assert_eq!(items[0]["time"], "today 1-m");
        assert_eq!(items[0]["geo"], "TH-20");
    }

    #[test]
    fn timeline_maps_to_frame_with_partial_column() {
        let body = r#")]}',
{"default":{"timelineData":[
 {"time":"1700000000","value":[10,20]},
 {"time":"1700086400","value":[30,40],"isPartial":true}
]}}"#;
        let resp: MultilineResp = parse_xssi_json(body).unwrap();
        let frame = timeline_to_frame(&terms(&["A", "B"]), resp.default.timeline_data).unwrap();
        assert_eq!(frame.columns, terms(&["A", "B", PARTIAL_MARKER_COLUMN]));
        assert_eq!(frame.rows.len(), 2);
        assert_eq!(frame.rows[0].values, vec![10.0, 20.0, 0.0]);
        assert_eq!(frame.rows[1].values, vec![30.0, 40.0, 1.0]);
        assert_eq!(frame.rows[0].at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn empty_timeline_is_empty_frame() {
        let frame = timeline_to_frame(&terms(&["A"]), vec![]).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn mismatched_row_width_is_an_error() {
        let pts = vec![TimelinePoint {
            time: "1700000000".into(),
            value: vec![1.0],
            is_partial: false,
        }];
        assert!(timeline_to_frame(&terms(&["A", "B"]), pts).is_err());
    }

    #[test]
    fn ranked_lists_map_top_then_rising() {
        let body = r#"{"default":{"rankedList":[
 {"rankedKeyword":[{"query":"a price","value":100},{"query":"a review","value":55}]},
 {"rankedKeyword":[]}
]}}"#;
        let resp: RelatedResp = parse_xssi_json(body).unwrap();
        let rel = ranked_to_related(resp.default.ranked_list);
        let top = rel.top.unwrap();
        assert_eq!(top[0].query, "a price");
        assert_eq!(top[1].value, 55.0);
        assert_eq!(rel.rising, Some(vec![]));

        let none = ranked_to_related(vec![]);
        assert!(none.top.is_none() && none.rising.is_none());
    }

    #[test]
    fn widget_keyword_reads_restriction() {
        let w = Widget {
            id: "RELATED_QUERIES_1".into(),
            token: "x".into(),
            request: json!({"restriction":{"complexKeywordsRestriction":{"keyword":[{"type":"BROAD","value":"BYD"}]}}}),
        };
        assert_eq!(widget_keyword(&w).as_deref(), Some("BYD"));
        assert_eq!(single_term(&terms(&["A"])).as_deref(), Some("A"));
        assert!(single_term(&terms(&["A", "B"])).is_none());
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(0.1, 1), Duration::from_secs_f64(0.1));
        assert_eq!(backoff_delay(0.1, 2), Duration::from_secs_f64(0.2));
        assert_eq!(backoff_delay(0.5, 3), Duration::from_secs_f64(2.0));
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }

    #[test]
    fn trending_rss_parses_titles_and_dates() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Daily Search Trends</title>
<item><title>Tom &amp; Jerry</title><link>https://trends.google.com/x</link>
<pubDate>Sat, 06 Sep 2025 09:00:00 +0000</pubDate></item>
<item><title>  </title></item>
</channel></rss>"#;
        let items = parse_trending_rss(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Tom & Jerry");
        assert_eq!(items[0].published_at, Some(1_757_149_200));
        assert_eq!(items[0].url.as_deref(), Some("https://trends.google.com/x"));
    }

    /// Local stand-in for the provider endpoints; counts explores and records widget tokens.
    #[derive(Default)]
    struct Stub {
        explores: AtomicUsize,
        tokens: Mutex<Vec<String>>,
        reject_series: AtomicBool,
    }

    impl Stub {
        fn record(&self, q: &HashMap<String, String>) {
            let token = q.get("token").cloned().unwrap_or_default();
            self.tokens.lock().unwrap().push(token);
        }

        fn tokens(&self) -> Vec<String> {
            self.tokens.lock().unwrap().clone()
        }
    }

    async fn stub_explore(State(s): State<Arc<Stub>>) -> String {
        let n = s.explores.fetch_add(1, Ordering::SeqCst) + 1;
        let body = json!({ "widgets": [
            { "id": "TIMESERIES", "token": format!("tok{n}"), "request": {} },
            {
                "id": "RELATED_QUERIES",
                "token": format!("rel{n}"),
                "request": { "restriction": { "complexKeywordsRestriction": {
                    "keyword": [{ "type": "BROAD", "value": "A" }]
                } } }
            }
        ] });
        format!(")]}}'\n{body}")
    }

    async fn stub_multiline(
        State(s): State<Arc<Stub>>,
        QueryParams(q): QueryParams<HashMap<String, String>>,
    ) -> (axum::http::StatusCode, String) {
        s.record(&q);
        if s.reject_series.swap(false, Ordering::SeqCst) {
            return (axum::http::StatusCode::BAD_REQUEST, "expired token".into());
        }
        let body = json!({ "default": { "timelineData": [
            { "time": "1700000000", "value": [10] },
            { "time": "1700086400", "value": [20], "isPartial": true }
        ] } });
        (axum::http::StatusCode::OK, format!(")]}}',\n{body}"))
    }

    async fn stub_related(
        State(s): State<Arc<Stub>>,
        QueryParams(q): QueryParams<HashMap<String, String>>,
    ) -> String {
        s.record(&q);
        let body = json!({ "default": { "rankedList": [
            { "rankedKeyword": [{ "query": "a price", "value": 100 }] },
            { "rankedKeyword": [] }
        ] } });
        format!(")]}}',\n{body}")
    }

    async fn spawn_stub() -> (GoogleTrendsProvider, Arc<Stub>) {
        let stub = Arc::new(Stub::default());
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route(EXPLORE_PATH, post(stub_explore))
            .route(MULTILINE_PATH, get(stub_multiline))
            .route(RELATED_PATH, get(stub_related))
            .with_state(stub.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let cfg = ProviderConfig {
            base_url: format!("http://{addr}"),
            retries: 0,
            ..ProviderConfig::default()
        };
        (GoogleTrendsProvider::new(cfg).unwrap(), stub)
    }

    #[tokio::test]
    async fn every_series_call_explores_for_a_fresh_token() {
        let (p, stub) = spawn_stub().await;
        let t = terms(&["A"]);

        let frame = p.interest_over_time(&t, "XX", Timeframe::PastMonth).await.unwrap();
        assert_eq!(frame.rows.len(), 2);
        p.interest_over_time(&t, "XX", Timeframe::PastMonth).await.unwrap();

        assert_eq!(stub.explores.load(Ordering::SeqCst), 2);
        assert_eq!(stub.tokens(), vec!["tok1", "tok2"]);
    }

    #[tokio::test]
    async fn related_call_reuses_series_widgets_only_once() {
        let (p, stub) = spawn_stub().await;
        let t = terms(&["A"]);

        p.interest_over_time(&t, "XX", Timeframe::PastMonth).await.unwrap();
        let rel = p.related_queries(&t, "XX", Timeframe::PastMonth).await.unwrap();
        assert_eq!(rel["A"].top.as_ref().unwrap()[0].query, "a price");
        assert_eq!(stub.explores.load(Ordering::SeqCst), 1);

        p.related_queries(&t, "XX", Timeframe::PastMonth).await.unwrap();
        assert_eq!(stub.explores.load(Ordering::SeqCst), 2);
        assert_eq!(stub.tokens(), vec!["tok1", "rel1", "rel2"]);
    }

    #[tokio::test]
    async fn failed_series_call_drops_its_widgets() {
        let (p, stub) = spawn_stub().await;
        let t = terms(&["A"]);
        stub.reject_series.store(true, Ordering::SeqCst);

        let err = p
            .interest_over_time(&t, "XX", Timeframe::PastMonth)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("400"));

        p.related_queries(&t, "XX", Timeframe::PastMonth).await.unwrap();
        assert_eq!(stub.explores.load(Ordering::SeqCst), 2);
        assert_eq!(stub.tokens(), vec!["tok1", "rel2"]);
    }

    #[tokio::test]
    async fn widgets_of_another_query_are_not_reused() {
        let (p, stub) = spawn_stub().await;
        p.interest_over_time(&terms(&["A"]), "XX", Timeframe::PastMonth)
            .await
            .unwrap();
        p.related_queries(&terms(&["A"]), "YY", Timeframe::PastMonth)
            .await
            .unwrap();
        assert_eq!(stub.explores.load(Ordering::SeqCst), 2);
    }
}
