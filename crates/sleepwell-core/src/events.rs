use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::TriggerCheck;
use crate::clock::TimeOfDay;
use crate::color::Rgb;
use crate::pomodoro::SessionType;

/// Every state change in the system produces an Event.
/// Front ends render them; the CLI prints them as JSON lines on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        duration_minutes: u32,
        sound_id: Option<String>,
        color: Rgb,
        fullscreen: bool,
        at: DateTime<Utc>,
    },
    SessionPaused {
        brightness: f64,
        seconds_remaining: f64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        paused_ms: i64,
        at: DateTime<Utc>,
    },
    /// Brightness reached zero; the session stays active in the dark.
    FadeCompleted {
        at: DateTime<Utc>,
    },
    SessionStopped {
        at: DateTime<Utc>,
    },
    AlarmArmed {
        target: TimeOfDay,
        at: DateTime<Utc>,
    },
    AlarmDisarmed {
        at: DateTime<Utc>,
    },
    AlarmTriggered {
        target: TimeOfDay,
        via: TriggerCheck,
        at: DateTime<Utc>,
    },
    /// A triggered alarm went back to active on a new day.
    AlarmRearmed {
        target: TimeOfDay,
        at: DateTime<Utc>,
    },
    PomodoroStarted {
        session_type: SessionType,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    PomodoroPaused {
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    PomodoroResumed {
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    PomodoroStopped {
        session_type: SessionType,
        at: DateTime<Utc>,
    },
    PomodoroSwitched {
        session_type: SessionType,
        at: DateTime<Utc>,
    },
    PomodoroCompleted {
        completed: SessionType,
        next: SessionType,
        completed_work_sessions: u32,
        total_focus_minutes: u32,
        /// The next session will start on its own after a short delay.
        auto_start: bool,
        at: DateTime<Utc>,
    },
}
