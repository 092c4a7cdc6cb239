//! Best-effort platform capabilities.
//!
//! Fullscreen presentation, notifications and screen wake locks may be
//! missing or refuse a request. None of them is allowed to block the flow
//! that asked for it, so callers go through the `*_best_effort` helpers,
//! which log failures and move on.

use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

/// Full-screen presentation of the overlay.
pub trait Presenter: Send + Sync {
    fn enter_fullscreen(&self) -> Result<(), CapabilityError>;
    fn exit_fullscreen(&self) -> Result<(), CapabilityError>;
}

/// Notification permission, decided once per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not asked yet.
    Default,
    Granted,
    Denied,
}

pub trait Notifier: Send + Sync {
    fn permission(&self) -> Permission;

    /// Ask the user. Only called while the permission is `Default`.
    fn request_permission(&self) -> Permission;

    fn notify(&self, title: &str, body: &str) -> Result<(), CapabilityError>;
}

/// Keeps the screen from sleeping while held.
pub trait WakeLock: Send + Sync {
    fn acquire(&self) -> Result<(), CapabilityError>;
    fn release(&self);
}

/// A presenter for surfaces with no fullscreen mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPresenter;

impl Presenter for NoPresenter {
    fn enter_fullscreen(&self) -> Result<(), CapabilityError> {
        Err(CapabilityError::unavailable("fullscreen", "not supported"))
    }

    fn exit_fullscreen(&self) -> Result<(), CapabilityError> {
        Ok(())
    }
}

/// Notifications that were never permitted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNotifier;

impl Notifier for NoNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    fn notify(&self, _title: &str, _body: &str) -> Result<(), CapabilityError> {
        Err(CapabilityError::unavailable("notifications", "not supported"))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoWakeLock;

impl WakeLock for NoWakeLock {
    fn acquire(&self) -> Result<(), CapabilityError> {
        Err(CapabilityError::unavailable("wake lock", "not supported"))
    }

    fn release(&self) {}
}

/// Returns whether fullscreen was entered.
pub fn enter_fullscreen_best_effort(presenter: &dyn Presenter) -> bool {
    match presenter.enter_fullscreen() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("failed to enter fullscreen: {e}");
            false
        }
    }
}

pub fn exit_fullscreen_best_effort(presenter: &dyn Presenter) {
    if let Err(e) = presenter.exit_fullscreen() {
        tracing::warn!("failed to exit fullscreen: {e}");
    }
}

/// Sends only when permission was granted. Returns whether it was sent.
pub fn notify_if_permitted(notifier: &dyn Notifier, title: &str, body: &str) -> bool {
    if notifier.permission() != Permission::Granted {
        tracing::debug!("notification suppressed, permission not granted");
        return false;
    }
    match notifier.notify(title, body) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("notification failed: {e}");
            false
        }
    }
}

/// Asks once if the user has not decided yet.
pub fn request_permission_once(notifier: &dyn Notifier) -> Permission {
    match notifier.permission() {
        Permission::Default => notifier.request_permission(),
        decided => decided,
    }
}

/// Returns whether the lock is held.
pub fn acquire_wake_lock_best_effort(lock: &dyn WakeLock) -> bool {
    match lock.acquire() {
        Ok(()) => {
            tracing::info!("wake lock acquired for alarm");
            true
        }
        Err(e) => {
            tracing::warn!("wake lock failed: {e}");
            false
        }
    }
}
