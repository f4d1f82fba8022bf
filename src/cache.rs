//! # Result cache
//! Process-wide map from `CacheKey` to a stored value with an absolute (non-sliding) TTL.
//!
//! Entries are never mutated in place: a write replaces the whole entry, and a stale
//! entry is simply ignored until it is overwritten or pruned.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: DateTime<Utc>,
    ttl: ChronoDuration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) < self.ttl
    }
}

/// Thread-safe TTL map. Each entry carries its own TTL so callers can
/// apply different policies to different values.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    inner: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh value for `key` at `now`, if any.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.get(key)
            .filter(|e| e.is_fresh(now))
            .map(|e| e.value.clone())
    }

    /// Insert or replace. A non-positive `ttl` stores nothing.
    /// Stale entries are dropped on every insert, so only live keys are held.
    pub fn insert(&self, key: K, value: V, now: DateTime<Utc>, ttl: ChronoDuration) {
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.retain(|_, e| e.is_fresh(now));
        if ttl <= ChronoDuration::zero() {
            return;
        }
        map.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                ttl,
            },
        );
    }

    /// Drop every stale entry; returns how many were removed.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let before = map.len();
        map.retain(|_, e| e.is_fresh(now));
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
