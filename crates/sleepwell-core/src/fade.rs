//! Fade-brightness engine.
//!
//! Brightness decays linearly from 1 to 0 over the configured duration:
//!
//! ```text
//! elapsed_min = (now - started_at) / 60_000
//! progress    = clamp(elapsed_min / duration_min, 0, 1)
//! brightness  = 1 - progress
//! remaining   = max(duration_min - elapsed_min, 0) * 60
//! ```
//!
//! The engine is a pure function of its inputs. Pause handling lives in
//! [`SessionClock`](crate::session::SessionClock), which hands the engine
//! an effective start that already excludes paused spans.

use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: f64 = 60_000.0;

/// One evaluation of the fade at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeFrame {
    /// Overlay brightness in `[0, 1]`.
    pub brightness: f64,
    /// Fraction of the fade elapsed in `[0, 1]`.
    pub progress: f64,
    pub seconds_remaining: f64,
    /// `progress` has reached 1.
    pub complete: bool,
}

impl FadeFrame {
    /// The frame at the instant a fade begins.
    pub fn initial(duration_minutes: u32) -> Self {
        Self {
            brightness: 1.0,
            progress: 0.0,
            seconds_remaining: duration_minutes as f64 * 60.0,
            complete: false,
        }
    }

    /// Remaining time as `M:SS`.
    pub fn remaining_display(&self) -> String {
        format_remaining(self.seconds_remaining)
    }
}

/// Compute the frame for `now_ms` given the effective start of the fade.
///
/// A zero duration is treated as already complete.
pub fn compute(started_at_ms: i64, now_ms: i64, duration_minutes: u32) -> FadeFrame {
    let duration = duration_minutes as f64;
    let elapsed_min = (now_ms - started_at_ms) as f64 / MS_PER_MINUTE;
    let progress = if duration > 0.0 {
        (elapsed_min / duration).clamp(0.0, 1.0)
    } else {
        1.0
    };
    FadeFrame {
        brightness: 1.0 - progress,
        progress,
        seconds_remaining: (duration - elapsed_min).clamp(0.0, duration) * 60.0,
        complete: progress >= 1.0,
    }
}

/// `M:SS` with whole seconds truncated.
pub fn format_remaining(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
