//! Pause-aware session clock.
//!
//! Invariant: `started_at_ms` is the *effective* start. Resuming shifts it
//! forward by the paused span, so `now - started_at_ms` never counts time
//! spent paused and a pause of length `P` delays the whole trajectory by
//! exactly `P`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClock {
    started_at_ms: i64,
    paused_at_ms: Option<i64>,
}

impl SessionClock {
    pub fn start(now_ms: i64) -> Self {
        Self {
            started_at_ms: now_ms,
            paused_at_ms: None,
        }
    }

    pub fn started_at_ms(&self) -> i64 {
        self.started_at_ms
    }

    pub fn paused_at_ms(&self) -> Option<i64> {
        self.paused_at_ms
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at_ms.is_some()
    }

    /// Returns `false` if already paused.
    pub fn pause(&mut self, now_ms: i64) -> bool {
        if self.paused_at_ms.is_some() {
            return false;
        }
        self.paused_at_ms = Some(now_ms);
        true
    }

    /// Returns the span that was excluded, or `None` if not paused.
    pub fn resume(&mut self, now_ms: i64) -> Option<i64> {
        let paused_at = self.paused_at_ms.take()?;
        let span = (now_ms - paused_at).max(0);
        self.started_at_ms += span;
        Some(span)
    }

    /// Elapsed running time. Frozen at the pause instant while paused.
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        let reference = self.paused_at_ms.unwrap_or(now_ms);
        (reference - self.started_at_ms).max(0)
    }
}
