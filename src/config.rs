// src/config.rs
//! Dashboard configuration: TOML file with serde defaults, then env overrides.
//!
//! Lookup order for the file:
//! 1) $TRENDS_CONFIG_PATH (must exist when set)
//! 2) config/dashboard.toml
//! 3) built-in defaults
//!
//! Out-of-range values are sanitized rather than rejected.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::query::DEFAULT_MAX_TERMS;

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

pub const ENV_CONFIG_PATH: &str = "TRENDS_CONFIG_PATH";
pub const ENV_COOLDOWN_SECS: &str = "TRENDS_COOLDOWN_SECS";
pub const ENV_CACHE_TTL_SECS: &str = "TRENDS_CACHE_TTL_SECS";
pub const ENV_FAILURE_TTL_SECS: &str = "TRENDS_FAILURE_TTL_SECS";
/// `"min-max"` in milliseconds, or a single value for a fixed delay.
pub const ENV_RELATED_DELAY_MS: &str = "TRENDS_RELATED_DELAY_MS";
pub const ENV_PROVIDER: &str = "TRENDS_PROVIDER";
pub const ENV_EXPOSE_METRICS: &str = "TRENDS_EXPOSE_METRICS";

fn default_cooldown_secs() -> i64 {
    20
}
fn default_cache_ttl_secs() -> i64 {
    3600
}
fn default_failure_ttl_secs() -> i64 {
    60
}
fn default_related_delay_min_ms() -> u64 {
    1000
}
fn default_related_delay_max_ms() -> u64 {
    2000
}
fn default_max_terms() -> usize {
    DEFAULT_MAX_TERMS
}
fn default_session_idle_secs() -> i64 {
    24 * 3600
}
fn default_true() -> bool {
    true
}
fn default_hl() -> String {
    "en-US".to_string()
}
fn default_retries() -> u8 {
    2
}
fn default_backoff_factor() -> f64 {
    0.1
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_timeout_secs() -> u64 {
    25
}
fn default_base_url() -> String {
    "https://trends.google.com".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Google,
    Mock,
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(anyhow!("unsupported provider '{other}'")),
        }
    }
}

/// Remote client contract: retries, backoff and timeouts belong here, not in the fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    /// Interface language, e.g. "th-TH". Its region suffix seeds the cookie bootstrap.
    #[serde(default = "default_hl")]
    pub hl: String,
    /// Sent as `tz`: minutes west of UTC, so UTC+7 is -420.
    #[serde(default)]
    pub tz_offset_minutes: i32,
    #[serde(default = "default_retries")]
    pub retries: u8,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            hl: default_hl(),
            tz_offset_minutes: 0,
            retries: default_retries(),
            backoff_factor: default_backoff_factor(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Minimum seconds between two accepted fetches of one session.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: i64,
    /// TTL of successful results.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,
    /// TTL of failed results; 0 disables caching of failures.
    #[serde(default = "default_failure_ttl_secs")]
    pub failure_ttl_secs: i64,
    /// Pacing delay before the related-queries call, picked uniformly in [min, max].
    #[serde(default = "default_related_delay_min_ms")]
    pub related_delay_min_ms: u64,
    #[serde(default = "default_related_delay_max_ms")]
    pub related_delay_max_ms: u64,
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: i64,
    #[serde(default = "default_true")]
    pub expose_metrics: bool,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            failure_ttl_secs: default_failure_ttl_secs(),
            related_delay_min_ms: default_related_delay_min_ms(),
            related_delay_max_ms: default_related_delay_max_ms(),
            max_terms: default_max_terms(),
            session_idle_secs: default_session_idle_secs(),
            expose_metrics: true,
            provider: ProviderConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        let mut cfg: DashboardConfig = toml::from_str(&data)
            .with_context(|| format!("parsing dashboard config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// File lookup (see module docs) followed by env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env()?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = parse_env::<i64>(ENV_COOLDOWN_SECS)? {
            self.cooldown_secs = v;
        }
        if let Some(v) = parse_env::<i64>(ENV_CACHE_TTL_SECS)? {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = parse_env::<i64>(ENV_FAILURE_TTL_SECS)? {
            self.failure_ttl_secs = v;
        }
        if let Ok(raw) = std::env::var(ENV_RELATED_DELAY_MS) {
            let (min, max) = parse_delay_range(&raw)
                .with_context(|| format!("{ENV_RELATED_DELAY_MS}='{raw}'"))?;
            self.related_delay_min_ms = min;
            self.related_delay_max_ms = max;
        }
        if let Ok(raw) = std::env::var(ENV_PROVIDER) {
            self.provider.kind = raw.parse()?;
        }
        if let Ok(raw) = std::env::var(ENV_EXPOSE_METRICS) {
            self.expose_metrics = matches!(raw.trim(), "1" | "true" | "yes");
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        self.cooldown_secs = self.cooldown_secs.max(0);
        self.cache_ttl_secs = self.cache_ttl_secs.max(0);
        self.failure_ttl_secs = self.failure_ttl_secs.clamp(0, self.cache_ttl_secs);
        if self.related_delay_min_ms > self.related_delay_max_ms {
            std::mem::swap(&mut self.related_delay_min_ms, &mut self.related_delay_max_ms);
        }
        if self.max_terms == 0 {
            self.max_terms = default_max_terms();
        }
        self.session_idle_secs = self.session_idle_secs.max(self.cooldown_secs);
        if !self.provider.backoff_factor.is_finite() || self.provider.backoff_factor < 0.0 {
            self.provider.backoff_factor = default_backoff_factor();
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("{name} has invalid value '{raw}'")),
        Err(_) => Ok(None),
    }
}

/// `"1000-2000"` or `"500"`.
fn parse_delay_range(raw: &str) -> Result<(u64, u64)> {
    let raw = raw.trim();
    match raw.split_once('-') {
        Some((a, b)) => Ok((a.trim().parse()?, b.trim().parse()?)),
        None => {
            let v = raw.parse()?;
            Ok((v, v))
        }
    }
}
