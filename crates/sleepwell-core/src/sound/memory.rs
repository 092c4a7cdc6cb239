//! In-memory audio backend.
//!
//! Produces no sound; records what was asked of each handle. Used for
//! `--mute` runs and throughout the tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{AudioBackend, AudioHandle, SoundHandle};
use crate::error::PlaybackError;

/// Observable state of a [`MemoryHandle`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryState {
    pub playing: bool,
    pub looping: bool,
    pub volume: f32,
    /// Position is at the beginning of the asset.
    pub at_start: bool,
    pub play_calls: u32,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            playing: false,
            looping: false,
            volume: 1.0,
            at_start: true,
            play_calls: 0,
        }
    }
}

#[derive(Debug)]
pub struct MemoryHandle {
    path: PathBuf,
    fail: bool,
    state: Mutex<MemoryState>,
}

impl MemoryHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> MemoryState {
        self.with_state(|s| s.clone())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl AudioHandle for MemoryHandle {
    fn play(&self) -> Result<(), PlaybackError> {
        self.with_state(|s| s.play_calls += 1);
        if self.fail {
            return Err(PlaybackError::AssetMissing(self.path.clone()));
        }
        self.with_state(|s| {
            s.playing = true;
            s.at_start = false;
        });
        Ok(())
    }

    fn pause(&self) {
        self.with_state(|s| s.playing = false);
    }

    fn set_loop(&self, looping: bool) {
        self.with_state(|s| s.looping = looping);
    }

    fn set_volume(&self, volume: f32) {
        self.with_state(|s| s.volume = volume.clamp(0.0, 1.0));
    }

    fn seek_to_start(&self) {
        self.with_state(|s| s.at_start = true);
    }

    fn is_playing(&self) -> bool {
        self.with_state(|s| s.playing)
    }
}

/// Backend handing out [`MemoryHandle`]s.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    failing: HashSet<String>,
    opened: Mutex<HashMap<String, (usize, Arc<MemoryHandle>)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `play` fail for `id`, as for a missing asset.
    pub fn failing(mut self, id: impl Into<String>) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// How many times `open` was called for `id`.
    pub fn open_count(&self, id: &str) -> usize {
        self.opened
            .lock()
            .ok()
            .and_then(|m| m.get(id).map(|(n, _)| *n))
            .unwrap_or(0)
    }

    pub fn handle(&self, id: &str) -> Option<Arc<MemoryHandle>> {
        self.opened
            .lock()
            .ok()
            .and_then(|m| m.get(id).map(|(_, h)| Arc::clone(h)))
    }

    pub fn state(&self, id: &str) -> Option<MemoryState> {
        self.handle(id).map(|h| h.state())
    }
}

impl AudioBackend for MemoryBackend {
    fn open(&self, id: &str, path: &Path) -> SoundHandle {
        let handle = Arc::new(MemoryHandle {
            path: path.to_path_buf(),
            fail: self.failing.contains(id),
            state: Mutex::new(MemoryState::default()),
        });
        if let Ok(mut opened) = self.opened.lock() {
            let entry = opened
                .entry(id.to_string())
                .or_insert_with(|| (0, Arc::clone(&handle)));
            entry.0 += 1;
            entry.1 = Arc::clone(&handle);
        }
        handle
    }
}
