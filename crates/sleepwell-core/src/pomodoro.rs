//! Pomodoro focus timer.
//!
//! Like the wind-down controller this is a wall-clock state machine with no
//! internal thread: the caller invokes `tick()` periodically and elapsed
//! time is flushed from the injected clock.
//!
//! ```text
//! Work -> ShortBreak -> Work -> ... -> Work -> LongBreak -> Work
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{SessionError, ValidationError};
use crate::events::Event;

/// Pause between a completion and an automatic start of the next session.
pub const AUTO_START_DELAY_MS: i64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn is_break(self) -> bool {
        !matches!(self, SessionType::Work)
    }

    /// What to tell the user when this session comes up next.
    pub fn next_session_message(self) -> &'static str {
        match self {
            SessionType::Work => "Time to get back to work!",
            SessionType::ShortBreak => "Take a short break!",
            SessionType::LongBreak => "Enjoy your long break!",
        }
    }

    /// Notification title when this session finishes.
    pub fn completion_title(self) -> &'static str {
        match self {
            SessionType::Work => "Focus Session Complete!",
            SessionType::ShortBreak | SessionType::LongBreak => "Break Complete!",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionType::Work => "Work",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        })
    }
}

impl FromStr for SessionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "work" | "focus" => Ok(SessionType::Work),
            "short" | "short_break" | "shortbreak" => Ok(SessionType::ShortBreak),
            "long" | "long_break" | "longbreak" => Ok(SessionType::LongBreak),
            _ => Err(ValidationError::UnknownId {
                kind: "session type".into(),
                id: s.to_string(),
            }),
        }
    }
}

/// Durations are in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PomodoroSettings {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub sessions_until_long_break: u32,
    pub auto_start_breaks: bool,
    pub auto_start_work: bool,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_until_long_break: 4,
            auto_start_breaks: false,
            auto_start_work: false,
        }
    }
}

impl PomodoroSettings {
    pub fn minutes_for(&self, session: SessionType) -> u32 {
        match session {
            SessionType::Work => self.work_minutes,
            SessionType::ShortBreak => self.short_break_minutes,
            SessionType::LongBreak => self.long_break_minutes,
        }
    }

    pub fn duration_ms(&self, session: SessionType) -> u64 {
        self.minutes_for(session) as u64 * 60_000
    }

    fn auto_starts(&self, session: SessionType) -> bool {
        if session.is_break() {
            self.auto_start_breaks
        } else {
            self.auto_start_work
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let ranges = [
            ("work_minutes", self.work_minutes, 1u32, 180u32),
            ("short_break_minutes", self.short_break_minutes, 1, 60),
            ("long_break_minutes", self.long_break_minutes, 1, 120),
            ("sessions_until_long_break", self.sessions_until_long_break, 1, 12),
        ];
        for (field, value, min, max) in ranges {
            if !(min..=max).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    field: field.into(),
                    value: value as i64,
                    min: min as i64,
                    max: max as i64,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

impl TimerStatus {
    fn as_str(self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        }
    }
}

pub struct PomodoroTimer {
    clock: Arc<dyn Clock>,
    settings: PomodoroSettings,
    session_type: SessionType,
    status: TimerStatus,
    remaining_ms: u64,
    /// Clock reading at the last flush while running.
    last_tick_ms: Option<i64>,
    /// When a pending automatic start is due.
    auto_start_at_ms: Option<i64>,
    completed_work_sessions: u32,
    total_focus_minutes: u32,
}

impl PomodoroTimer {
    /// Starts idle on a full work session.
    pub fn new(clock: Arc<dyn Clock>, settings: PomodoroSettings) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self {
            clock,
            remaining_ms: settings.duration_ms(SessionType::Work),
            settings,
            session_type: SessionType::Work,
            status: TimerStatus::Idle,
            last_tick_ms: None,
            auto_start_at_ms: None,
            completed_work_sessions: 0,
            total_focus_minutes: 0,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn settings(&self) -> &PomodoroSettings {
        &self.settings
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Whole seconds left, rounded up so the display reads 00:00 only at the end.
    pub fn seconds_remaining(&self) -> u64 {
        self.remaining_ms.div_ceil(1000)
    }

    pub fn total_ms(&self) -> u64 {
        self.settings.duration_ms(self.session_type)
    }

    /// 0.0 .. 100.0 progress within the current session.
    pub fn progress_pct(&self) -> f64 {
        let total = self.total_ms();
        if total == 0 {
            return 0.0;
        }
        (total - self.remaining_ms.min(total)) as f64 / total as f64 * 100.0
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn total_focus_minutes(&self) -> u32 {
        self.total_focus_minutes
    }

    /// The session that follows the current one.
    pub fn next_session(&self) -> SessionType {
        match self.session_type {
            SessionType::Work => {
                if (self.completed_work_sessions + 1) % self.settings.sessions_until_long_break == 0 {
                    SessionType::LongBreak
                } else {
                    SessionType::ShortBreak
                }
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
        }
    }

    pub fn next_session_message(&self) -> &'static str {
        self.next_session().next_session_message()
    }

    pub fn auto_start_pending(&self) -> bool {
        self.auto_start_at_ms.is_some()
    }

    /// `MM:SS` of the time left.
    pub fn display(&self) -> String {
        format_mm_ss(self.seconds_remaining())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start an idle timer; a paused one is resumed.
    pub fn start(&mut self) -> Option<Event> {
        match self.status {
            TimerStatus::Idle => {
                self.auto_start_at_ms = None;
                self.status = TimerStatus::Running;
                self.last_tick_ms = Some(self.clock.now_ms());
                tracing::info!(session = %self.session_type, "pomodoro started");
                Some(Event::PomodoroStarted {
                    session_type: self.session_type,
                    duration_secs: self.seconds_remaining(),
                    at: Utc::now(),
                })
            }
            TimerStatus::Paused => self.resume(),
            TimerStatus::Running => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        self.flush_elapsed();
        self.status = TimerStatus::Paused;
        self.last_tick_ms = None;
        Some(Event::PomodoroPaused {
            seconds_remaining: self.seconds_remaining(),
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Paused {
            return None;
        }
        self.status = TimerStatus::Running;
        self.last_tick_ms = Some(self.clock.now_ms());
        Some(Event::PomodoroResumed {
            seconds_remaining: self.seconds_remaining(),
            at: Utc::now(),
        })
    }

    /// Back to the full duration of the current session, not running.
    pub fn stop(&mut self) -> Event {
        self.status = TimerStatus::Idle;
        self.last_tick_ms = None;
        self.auto_start_at_ms = None;
        self.remaining_ms = self.total_ms();
        tracing::debug!(session = %self.session_type, "pomodoro stopped");
        Event::PomodoroStopped {
            session_type: self.session_type,
            at: Utc::now(),
        }
    }

    pub fn reset(&mut self) -> Event {
        self.stop()
    }

    /// Finish the current session now. Counts exactly like running out.
    /// Only a started session can be skipped.
    pub fn skip(&mut self) -> Option<Event> {
        match self.status {
            TimerStatus::Running | TimerStatus::Paused => Some(self.complete()),
            TimerStatus::Idle => None,
        }
    }

    /// Switch to another session type. Refused while a session is underway.
    pub fn select_session(&mut self, session: SessionType) -> Result<Event, SessionError> {
        if self.status != TimerStatus::Idle {
            return Err(SessionError::InvalidTransition {
                action: "switch",
                state: self.status.as_str(),
            });
        }
        self.session_type = session;
        self.auto_start_at_ms = None;
        self.remaining_ms = self.total_ms();
        Ok(Event::PomodoroSwitched {
            session_type: session,
            at: Utc::now(),
        })
    }

    /// Call periodically. Returns `PomodoroCompleted` when the countdown
    /// reaches zero and `PomodoroStarted` when a pending auto start fires.
    pub fn tick(&mut self) -> Option<Event> {
        match self.status {
            TimerStatus::Running => {
                self.flush_elapsed();
                (self.remaining_ms == 0).then(|| self.complete())
            }
            TimerStatus::Idle => {
                let due = self.auto_start_at_ms?;
                if self.clock.now_ms() < due {
                    return None;
                }
                self.start()
            }
            TimerStatus::Paused => None,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Event {
        let completed = self.session_type;
        let next = self.next_session();
        if completed == SessionType::Work {
            self.completed_work_sessions += 1;
            self.total_focus_minutes += self.settings.work_minutes;
        }

        self.session_type = next;
        self.status = TimerStatus::Idle;
        self.last_tick_ms = None;
        self.remaining_ms = self.total_ms();

        let auto_start = self.settings.auto_starts(next);
        self.auto_start_at_ms = auto_start.then(|| self.clock.now_ms() + AUTO_START_DELAY_MS);

        tracing::info!(
            completed = %completed,
            next = %next,
            work_sessions = self.completed_work_sessions,
            "pomodoro session complete"
        );
        Event::PomodoroCompleted {
            completed,
            next,
            completed_work_sessions: self.completed_work_sessions,
            total_focus_minutes: self.total_focus_minutes,
            auto_start,
            at: Utc::now(),
        }
    }

    fn flush_elapsed(&mut self) {
        if let Some(last) = self.last_tick_ms {
            let now = self.clock.now_ms();
            let elapsed = now.saturating_sub(last).max(0) as u64;
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_ms = Some(now);
        }
    }
}

impl fmt::Debug for PomodoroTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PomodoroTimer")
            .field("session_type", &self.session_type)
            .field("status", &self.status)
            .field("remaining_ms", &self.remaining_ms)
            .field("completed_work_sessions", &self.completed_work_sessions)
            .finish()
    }
}

/// `MM:SS`, minutes zero-padded and unbounded.
pub fn format_mm_ss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
