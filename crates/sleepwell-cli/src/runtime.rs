//! The interactive loop shared by `lighting`, `alarm` and `focus`.
//!
//! A current-thread tokio runtime multiplexes the frame interval, terminal
//! key events and Ctrl-C. Each command supplies a [`Screen`]; the loop only
//! drives it and draws what it returns.

use std::future::Future;
use std::io;
use std::time::Duration;

use crossterm::event::{Event as TermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use futures::StreamExt;
use sleepwell_core::Event;
use tokio::time::{interval, MissedTickBehavior};

use crate::overlay::{self, View};
use crate::platform::TerminalPresenter;

/// ~30 fps.
pub const FRAME_PERIOD: Duration = Duration::from_millis(33);

pub enum Control {
    Continue,
    Quit,
}

pub trait Screen {
    /// Advance state by one frame.
    fn on_frame(&mut self) -> Vec<Event>;
    fn on_key(&mut self, key: KeyEvent) -> Control;
    fn view(&self) -> View;
    fn is_finished(&self) -> bool {
        false
    }
    /// Tear down whatever is still running.
    fn on_exit(&mut self) -> Vec<Event>;
}

/// Run `future` to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(future: F) -> io::Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(rt.block_on(future))
}

/// Drive `screen` until it finishes, the user quits or Ctrl-C arrives.
///
/// Headless runs draw nothing, read no keys and print every event as a
/// JSON line on stdout.
pub async fn run<S: Screen>(screen: &mut S, presenter: &TerminalPresenter, headless: bool) -> io::Result<()> {
    let mut frames = interval(FRAME_PERIOD);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let raw = if headless { None } else { RawMode::enable() };
    let mut keys = raw.as_ref().map(|_| EventStream::new());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut out = io::stdout();

    loop {
        tokio::select! {
            _ = frames.tick() => {
                emit(screen.on_frame(), headless);
                if screen.is_finished() {
                    break;
                }
                if !headless {
                    overlay::draw(&mut out, &screen.view(), presenter.is_fullscreen())?;
                }
            }
            key = next_key(&mut keys) => match key {
                Some(key) if is_interrupt(&key) => break,
                Some(key) => {
                    if let Control::Quit = screen.on_key(key) {
                        break;
                    }
                }
                None => keys = None,
            },
            _ = &mut ctrl_c => break,
        }
    }

    emit(screen.on_exit(), headless);
    if !headless && !presenter.is_fullscreen() {
        overlay::finish_line(&mut out)?;
    }
    drop(raw);
    Ok(())
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Next key press; pending forever once input is gone.
async fn next_key(keys: &mut Option<EventStream>) -> Option<KeyEvent> {
    let Some(stream) = keys.as_mut() else {
        return std::future::pending().await;
    };
    loop {
        match stream.next().await {
            Some(Ok(TermEvent::Key(key))) if key.kind == KeyEventKind::Press => return Some(key),
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!("terminal input failed: {e}");
                return None;
            }
            None => return None,
        }
    }
}

pub fn emit(events: Vec<Event>, headless: bool) {
    for event in events {
        match serde_json::to_string(&event) {
            Ok(json) if headless => println!("{json}"),
            Ok(json) => tracing::info!(event = %json, "event"),
            Err(e) => tracing::warn!("failed to serialize event: {e}"),
        }
    }
}

/// Raw terminal input for the lifetime of the guard.
struct RawMode;

impl RawMode {
    fn enable() -> Option<Self> {
        match terminal::enable_raw_mode() {
            Ok(()) => Some(RawMode),
            Err(e) => {
                tracing::warn!("keyboard input unavailable: {e}");
                None
            }
        }
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!("failed to restore terminal: {e}");
        }
    }
}
