//! Alarm scheduler.
//!
//! Fires once when the local time of day reaches the target. Two checks
//! share one timer:
//!
//! - **exact match** on every tick: the current `HH:MM` equals the target;
//! - **window** every [`WINDOW_CHECK_PERIOD_SECS`]: the next occurrence of
//!   the target is at most [`WINDOW_LOOKAHEAD_SECS`] away. This catches a target
//!   minute that slipped between ticks while the process was throttled.
//!
//! [`AlarmScheduler::recheck_now`] runs the exact-match check outside the
//! regular cadence, for wakeups such as a terminal regaining focus.
//!
//! Only `Active` alarms fire, and firing moves to `Triggered`, so however
//! many checks observe the matching instant the alarm goes off once per arm
//! cycle.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::TimeOfDay;
use crate::events::Event;

/// Cadence the caller is expected to tick at.
pub const TICK_PERIOD_SECS: i64 = 1;
pub const WINDOW_CHECK_PERIOD_SECS: i64 = 30;
pub const WINDOW_LOOKAHEAD_SECS: i64 = 30;
/// No tick for this long while armed means the polling loop died.
pub const STALL_THRESHOLD_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmStatus {
    Inactive,
    Active,
    Triggered,
}

/// Which check noticed the target time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCheck {
    ExactMatch,
    Window,
    Recheck,
}

/// The next instant at which the wall clock reads `target`: today if that
/// is still ahead of `now`, otherwise tomorrow.
pub fn next_occurrence(target: TimeOfDay, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(target.to_naive_time());
    if today <= now {
        today + Duration::days(1)
    } else {
        today
    }
}

pub fn is_exact_match(target: TimeOfDay, now: NaiveDateTime) -> bool {
    TimeOfDay::from_time(&now) == target
}

/// The next occurrence is within the lookahead window and not in the past.
pub fn is_within_window(target: TimeOfDay, now: NaiveDateTime) -> bool {
    let until = next_occurrence(target, now) - now;
    until >= Duration::zero() && until <= Duration::seconds(WINDOW_LOOKAHEAD_SECS)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmScheduler {
    target: Option<TimeOfDay>,
    status: AlarmStatus,
    /// Re-arm a triggered alarm once the day it fired for has passed.
    auto_rearm: bool,
    /// Date of the occurrence that fired.
    fired_for: Option<NaiveDate>,
    last_window_check: Option<NaiveDateTime>,
    last_tick: Option<NaiveDateTime>,
}

impl AlarmScheduler {
    pub fn new(auto_rearm: bool) -> Self {
        Self {
            target: None,
            status: AlarmStatus::Inactive,
            auto_rearm,
            fired_for: None,
            last_window_check: None,
            last_tick: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> AlarmStatus {
        self.status
    }

    pub fn target(&self) -> Option<TimeOfDay> {
        self.target
    }

    pub fn last_tick(&self) -> Option<NaiveDateTime> {
        self.last_tick
    }

    /// Time left until the target, while armed.
    pub fn time_until(&self, now: NaiveDateTime) -> Option<Duration> {
        match (self.status, self.target) {
            (AlarmStatus::Active, Some(target)) => Some(next_occurrence(target, now) - now),
            _ => None,
        }
    }

    /// The polling loop has gone quiet while the alarm is armed.
    pub fn is_stalled(&self, now: NaiveDateTime) -> bool {
        self.status == AlarmStatus::Active
            && self
                .last_tick
                .is_some_and(|last| now - last > Duration::seconds(STALL_THRESHOLD_SECS))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Setting a target arms the alarm (also re-arming a triggered one);
    /// clearing it deactivates.
    pub fn set_target(&mut self, target: Option<TimeOfDay>) -> Event {
        self.target = target;
        self.fired_for = None;
        self.last_window_check = None;
        match target {
            Some(target) => {
                self.status = AlarmStatus::Active;
                tracing::info!(%target, "alarm armed");
                Event::AlarmArmed {
                    target,
                    at: Utc::now(),
                }
            }
            None => {
                self.status = AlarmStatus::Inactive;
                tracing::info!("alarm disarmed");
                Event::AlarmDisarmed { at: Utc::now() }
            }
        }
    }

    /// Regular timer tick. Runs the exact-match check, and the window check
    /// when its period has elapsed.
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<Event> {
        self.last_tick = Some(now);
        if let Some(rearmed) = self.maybe_rearm(now) {
            return Some(rearmed);
        }
        let target = self.armed_target()?;

        if is_exact_match(target, now) {
            return Some(self.fire(target, TriggerCheck::ExactMatch, now.date()));
        }

        let window_due = self
            .last_window_check
            .map_or(true, |last| now - last >= Duration::seconds(WINDOW_CHECK_PERIOD_SECS));
        if window_due {
            self.last_window_check = Some(now);
            if is_within_window(target, now) {
                let date = next_occurrence(target, now).date();
                return Some(self.fire(target, TriggerCheck::Window, date));
            }
        }
        None
    }

    /// Out-of-band exact-match check.
    pub fn recheck_now(&mut self, now: NaiveDateTime) -> Option<Event> {
        let target = self.armed_target()?;
        if is_exact_match(target, now) {
            return Some(self.fire(target, TriggerCheck::Recheck, now.date()));
        }
        None
    }

    fn armed_target(&self) -> Option<TimeOfDay> {
        match self.status {
            AlarmStatus::Active => self.target,
            AlarmStatus::Inactive | AlarmStatus::Triggered => None,
        }
    }

    fn fire(&mut self, target: TimeOfDay, via: TriggerCheck, occurrence: NaiveDate) -> Event {
        self.status = AlarmStatus::Triggered;
        self.fired_for = Some(occurrence);
        tracing::info!(%target, ?via, "alarm triggered");
        Event::AlarmTriggered {
            target,
            via,
            at: Utc::now(),
        }
    }

    fn maybe_rearm(&mut self, now: NaiveDateTime) -> Option<Event> {
        if !self.auto_rearm || self.status != AlarmStatus::Triggered {
            return None;
        }
        let fired_for = self.fired_for?;
        let target = self.target?;
        if now.date() <= fired_for {
            return None;
        }
        self.status = AlarmStatus::Active;
        self.fired_for = None;
        self.last_window_check = None;
        tracing::info!(%target, "alarm re-armed for a new day");
        Some(Event::AlarmRearmed {
            target,
            at: Utc::now(),
        })
    }
}
