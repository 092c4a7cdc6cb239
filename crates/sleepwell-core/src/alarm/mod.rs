//! Wake-up alarm.
//!
//! [`AlarmScheduler`] is the pure state machine deciding when the alarm
//! fires. [`AlarmClock`] wires it to the wind-down session, the wake sound,
//! notifications and the screen wake lock.

mod clock;
mod scheduler;

pub use clock::{AlarmClock, AlarmPlatform, WakeSettings, NOTIFICATION_TITLE};
pub use scheduler::{
    is_exact_match, is_within_window, next_occurrence, AlarmScheduler, AlarmStatus, TriggerCheck,
    STALL_THRESHOLD_SECS, TICK_PERIOD_SECS, WINDOW_CHECK_PERIOD_SECS, WINDOW_LOOKAHEAD_SECS,
};
