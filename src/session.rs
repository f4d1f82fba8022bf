//! session.rs: per-session cooldown gate and the last free-text keyword entry.
//!
//! One user's cooldown never blocks another's; nothing here is process-wide
//! except the map that holds the sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::gauge;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::rate_gate::RateGate;

/// Header carrying the opaque session id in both directions.
pub const SESSION_HEADER: &str = "x-session-id";

const SESSION_ID_LEN: usize = 32;
const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub gate: RateGate,
    /// Last comma-separated keyword entry, reused when a request names no terms.
    pub keywords: Option<String>,
    pub last_seen: DateTime<Utc>,
}

impl SessionState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            gate: RateGate::new(),
            keywords: None,
            last_seen: now,
        }
    }
}

#[derive(Debug)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, SessionState>>,
    idle: ChronoDuration,
}

impl SessionStore {
    pub fn new(idle_secs: i64) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            idle: ChronoDuration::seconds(idle_secs.max(0)),
        }
    }

    /// Run `f` against the session `id`, creating it if needed. Idle sessions are
    /// pruned on the way in. The lock is held only for the closure; never await inside.
    pub fn with_session<R>(
        &self,
        id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> R {
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let idle = self.idle;
        map.retain(|k, s| k == id || now.signed_duration_since(s.last_seen) < idle);
        let state = map
            .entry(id.to_string())
            .or_insert_with(|| SessionState::new(now));
        state.last_seen = now;
        let out = f(state);
        gauge!("trends_active_sessions").set(map.len() as f64);
        out
    }

    /// Read-only snapshot; `None` for unknown ids.
    pub fn snapshot(&self, id: &str) -> Option<SessionState> {
        let map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Random lowercase hex id.
pub fn new_session_id() -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut rng = rand::rng();
    (0..SESSION_ID_LEN)
        .map(|_| HEX[rng.random_range(0..16)] as char)
        .collect()
}

/// Accept client-supplied ids made of `[A-Za-z0-9_-]`, bounded in length.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Short digest for logs; raw ids are never logged.
pub(crate) fn anon_id(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
