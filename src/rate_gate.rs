// src/rate_gate.rs
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;

/// Outcome of a gate check. Denial is ordinary control flow, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateDecision {
    Allowed,
    Denied { remaining_secs: u64 },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }
}

/// Client-side cooldown between accepted fetches of one session.
/// - First attempt always passes.
/// - Inside the cooldown, attempts are denied and state is left untouched.
/// - Never sleeps; waiting is up to the caller.
#[derive(Debug, Clone, Default)]
pub struct RateGate {
    last_accepted_at: Option<DateTime<Utc>>,
}

impl RateGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `cooldown_secs` < 0 is treated as 0. A clock that went backwards counts as no time elapsed.
    pub fn try_acquire(&mut self, now: DateTime<Utc>, cooldown_secs: i64) -> GateDecision {
        let cooldown = ChronoDuration::seconds(cooldown_secs.max(0));
        let Some(last) = self.last_accepted_at else {
            self.last_accepted_at = Some(now);
            return GateDecision::Allowed;
        };

        let elapsed = now.signed_duration_since(last).max(ChronoDuration::zero());
        if elapsed >= cooldown {
            self.last_accepted_at = Some(now);
            return GateDecision::Allowed;
        }

        let remaining_ms = (cooldown - elapsed).num_milliseconds().max(0) as u64;
        GateDecision::Denied {
            remaining_secs: remaining_ms.div_ceil(1000),
        }
    }

    /// Seconds left before the next attempt would pass, without touching state.
    pub fn remaining(&self, now: DateTime<Utc>, cooldown_secs: i64) -> u64 {
        let mut probe = self.clone();
        match probe.try_acquire(now, cooldown_secs) {
            GateDecision::Allowed => 0,
            GateDecision::Denied { remaining_secs } => remaining_secs,
        }
    }

    pub fn last_accepted_at(&self) -> Option<DateTime<Utc>> {
        self.last_accepted_at
    }
}
