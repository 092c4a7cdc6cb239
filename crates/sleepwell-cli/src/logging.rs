//! Tracing setup.
//!
//! The overlay owns the terminal, so logs go to `<data dir>/sleepwell.log`.
//! Verbosity comes from `SLEEPWELL_LOG` (default `warn`).

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SLEEPWELL_LOG";
const LOG_FILE: &str = "sleepwell.log";

pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let file = sleepwell_core::config::data_dir().ok().and_then(|dir| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))
            .ok()
    });

    let installed = match file {
        Some(file) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if installed.is_err() {
        eprintln!("warning: logging already initialized");
    }
}
