pub mod alarm;
pub mod circadian;
pub mod config;
pub mod focus;
pub mod lighting;
pub mod presets;
pub mod sounds;

use std::sync::{Arc, Mutex, MutexGuard};

use sleepwell_core::clock::{Clock, SystemClock};
use sleepwell_core::sound::{SoundCatalog, SoundRegistry};
use sleepwell_core::{Config, ConfigError};

use crate::audio::AudioOutput;
use crate::platform::TerminalPresenter;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Everything an interactive command shares: settings, time, sounds and
/// the terminal.
pub struct Context {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub sounds: Arc<SoundRegistry>,
    pub presenter: Arc<TerminalPresenter>,
    _audio: AudioOutput,
}

impl Context {
    pub fn open(mute: bool) -> Result<Self, ConfigError> {
        let config = Config::load()?;
        let audio = AudioOutput::open(mute);
        let catalog = SoundCatalog::builtin(config.asset_dir());
        let sounds = Arc::new(SoundRegistry::new(catalog, audio.backend()));
        Ok(Self {
            config,
            clock: Arc::new(SystemClock),
            sounds,
            presenter: Arc::new(TerminalPresenter::new()),
            _audio: audio,
        })
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.sounds.shutdown();
    }
}

/// Lock, recovering the data from a poisoned mutex.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// `None` for ids that mean silence.
pub fn sound_choice(id: &str) -> Option<String> {
    (!sleepwell_core::sound::is_silent(id)).then(|| id.to_string())
}
