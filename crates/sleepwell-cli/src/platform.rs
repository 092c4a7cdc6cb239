//! Terminal and desktop implementations of the core capabilities.

use std::io::{IsTerminal, Write};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use sleepwell_core::capability::{Notifier, Permission, Presenter, WakeLock};
use sleepwell_core::CapabilityError;

const APP_NAME: &str = "SleepWell";

/// "Fullscreen" is the terminal's alternate screen.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    active: AtomicBool,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Presenter for TerminalPresenter {
    fn enter_fullscreen(&self) -> Result<(), CapabilityError> {
        let mut out = std::io::stdout();
        if !out.is_terminal() {
            return Err(CapabilityError::unavailable("fullscreen", "stdout is not a terminal"));
        }
        if self.active.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        execute!(out, EnterAlternateScreen, cursor::Hide).map_err(|e| {
            self.active.store(false, Ordering::SeqCst);
            CapabilityError::unavailable("fullscreen", e.to_string())
        })
    }

    fn exit_fullscreen(&self) -> Result<(), CapabilityError> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        let mut out = std::io::stdout();
        execute!(out, LeaveAlternateScreen, cursor::Show)
            .and_then(|()| out.flush())
            .map_err(|e| CapabilityError::unavailable("fullscreen", e.to_string()))
    }
}

impl Drop for TerminalPresenter {
    fn drop(&mut self) {
        let _ = self.exit_fullscreen();
    }
}

/// Desktop notifications through the session's notification daemon.
/// Permission is the user's `notifications.enabled` setting.
#[derive(Debug)]
pub struct DesktopNotifier {
    permission: Permission,
}

impl DesktopNotifier {
    pub fn new(permission: Permission) -> Self {
        Self { permission }
    }
}

impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&self) -> Permission {
        self.permission
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), CapabilityError> {
        notify_rust::Notification::new()
            .appname(APP_NAME)
            .summary(title)
            .body(body)
            .show()
            .map(|_| ())
            .map_err(|e| CapabilityError::unavailable("notifications", e.to_string()))
    }
}

/// Keeps the machine awake by holding a `systemd-inhibit` child process.
#[derive(Debug, Default)]
pub struct InhibitWakeLock {
    child: Mutex<Option<Child>>,
}

impl InhibitWakeLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WakeLock for InhibitWakeLock {
    fn acquire(&self) -> Result<(), CapabilityError> {
        let mut child = self
            .child
            .lock()
            .map_err(|_| CapabilityError::unavailable("wake lock", "lock poisoned"))?;
        if child.is_some() {
            return Ok(());
        }
        let spawned = Command::new("systemd-inhibit")
            .args([
                "--what=idle:sleep",
                "--who=sleepwell",
                "--why=Wake-up alarm armed",
                "--mode=block",
                "sleep",
                "infinity",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CapabilityError::unavailable("wake lock", e.to_string()))?;
        *child = Some(spawned);
        Ok(())
    }

    fn release(&self) {
        let Ok(mut child) = self.child.lock() else {
            return;
        };
        if let Some(mut process) = child.take() {
            if let Err(e) = process.kill() {
                tracing::debug!("wake lock process already gone: {e}");
            }
            let _ = process.wait();
            tracing::info!("wake lock released");
        }
    }
}

impl Drop for InhibitWakeLock {
    fn drop(&mut self) {
        self.release();
    }
}
