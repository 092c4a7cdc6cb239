//! Sound registry.
//!
//! Maps a sound id to a shared, lazily constructed playback handle. The
//! registry is an ordinary object owned by the application root; every
//! feature that plays sound borrows it through an `Arc`, so two features
//! asking for `"rain"` get the same handle.

mod memory;
mod mixer;

pub use memory::{MemoryBackend, MemoryHandle, MemoryState};
pub use mixer::{MixerChannel, SoundMixer};

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::PlaybackError;

/// Sound id meaning "no sound".
pub const NO_SOUND: &str = "none";

/// A playable audio resource. Methods take `&self`; implementations use
/// interior mutability so one handle can be shared between features.
pub trait AudioHandle: Send + Sync {
    /// Start or continue playback from the current position.
    fn play(&self) -> Result<(), PlaybackError>;
    /// Stop producing sound, keeping the position.
    fn pause(&self);
    fn set_loop(&self, looping: bool);
    /// `volume` in `0.0..=1.0`.
    fn set_volume(&self, volume: f32);
    fn seek_to_start(&self);
    fn is_playing(&self) -> bool;
}

pub type SoundHandle = Arc<dyn AudioHandle>;

/// Creates handles. Construction itself never fails; a missing or broken
/// asset surfaces when `play` is called.
pub trait AudioBackend: Send + Sync {
    fn open(&self, id: &str, path: &Path) -> SoundHandle;
}

/// True for ids that mean "play nothing".
pub fn is_silent(id: &str) -> bool {
    id.is_empty() || id == NO_SOUND
}

/// Loop `handle` at `volume_percent` and start it. Playback failures are
/// logged and swallowed.
pub fn play_looped(handle: &dyn AudioHandle, volume_percent: u8) {
    handle.set_loop(true);
    handle.set_volume(percent_to_volume(volume_percent));
    resume(handle);
}

/// Continue from the current position, logging failures.
pub fn resume(handle: &dyn AudioHandle) {
    if let Err(e) = handle.play() {
        tracing::warn!("sound playback failed: {e}");
    }
}

/// Pause and rewind to the beginning.
pub fn stop(handle: &dyn AudioHandle) {
    handle.pause();
    handle.seek_to_start();
}

pub fn percent_to_volume(percent: u8) -> f32 {
    percent.min(100) as f32 / 100.0
}

const DEFAULT_SOUNDS: &[(&str, &str)] = &[
    ("rain", "rain.mp3"),
    ("ocean", "waves.mp3"),
    ("forest", "forest.mp3"),
    ("thunder", "thunder.mp3"),
    ("wind", "wind.mp3"),
    ("fire", "fireplace.mp3"),
    ("white-noise", "white-noise.mp3"),
    ("pink-noise", "pink-noise.mp3"),
    ("brown-noise", "brown-noise.mp3"),
    ("space", "space.mp3"),
    ("meditation", "meditation.mp3"),
    ("delta", "delta.mp3"),
    ("theta", "theta.mp3"),
    ("birds", "morning-birds.mp3"),
    ("chimes", "wind-chimes.mp3"),
    ("piano", "gentle-piano.mp3"),
    ("bells", "temple-bell.mp3"),
    ("awakening", "awakening-melody.mp3"),
];

/// Static id -> asset file mapping rooted at an asset directory.
#[derive(Debug, Clone)]
pub struct SoundCatalog {
    asset_dir: PathBuf,
    files: BTreeMap<String, String>,
}

impl SoundCatalog {
    /// The built-in sound set.
    pub fn builtin(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            files: DEFAULT_SOUNDS
                .iter()
                .map(|(id, file)| (id.to_string(), file.to_string()))
                .collect(),
        }
    }

    /// Add or replace an entry.
    pub fn with_sound(mut self, id: impl Into<String>, file: impl Into<String>) -> Self {
        self.files.insert(id.into(), file.into());
        self
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    pub fn contains(&self, id: &str) -> bool {
        self.files.contains_key(id)
    }

    pub fn path_for(&self, id: &str) -> Option<PathBuf> {
        self.files.get(id).map(|file| self.asset_dir.join(file))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

/// Lazily constructed, cached sound handles.
pub struct SoundRegistry {
    catalog: SoundCatalog,
    backend: Arc<dyn AudioBackend>,
    cache: Mutex<HashMap<String, SoundHandle>>,
}

impl SoundRegistry {
    pub fn new(catalog: SoundCatalog, backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            catalog,
            backend,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    /// Handle for `id`, constructed on first access and reused afterwards.
    /// `None` for unknown ids and for [`NO_SOUND`].
    pub fn get(&self, id: &str) -> Option<SoundHandle> {
        if is_silent(id) {
            return None;
        }
        let path = self.catalog.path_for(id)?;
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        let handle = cache.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!(id, path = %path.display(), "opening sound");
            self.backend.open(id, &path)
        });
        Some(Arc::clone(handle))
    }

    /// Number of handles constructed so far.
    pub fn loaded(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Stop and rewind every handle handed out. Called on app teardown.
    pub fn shutdown(&self) {
        if let Ok(cache) = self.cache.lock() {
            for handle in cache.values() {
                stop(handle.as_ref());
            }
        }
    }
}

impl std::fmt::Debug for SoundRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundRegistry")
            .field("catalog", &self.catalog)
            .field("loaded", &self.loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (Arc<MemoryBackend>, SoundRegistry) {
        let backend = Arc::new(MemoryBackend::new());
        let registry = SoundRegistry::new(SoundCatalog::builtin("/assets"), backend.clone());
        (backend, registry)
    }

    #[test]
    fn handles_are_constructed_once_per_id() {
        let (backend, registry) = registry();
        let a = registry.get("rain").unwrap();
        let b = registry.get("rain").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(backend.open_count("rain"), 1);
        assert_eq!(registry.loaded(), 1);
    }

    #[test]
    fn unknown_and_silent_ids_have_no_handle() {
        let (backend, registry) = registry();
        assert!(registry.get("none").is_none());
        assert!(registry.get("").is_none());
        assert!(registry.get("bagpipes").is_none());
        assert_eq!(backend.open_count("bagpipes"), 0);
    }

    #[test]
    fn catalog_maps_ids_to_asset_files() {
        let catalog = SoundCatalog::builtin("/assets");
        assert_eq!(catalog.path_for("ocean"), Some(PathBuf::from("/assets/waves.mp3")));
        assert_eq!(
            catalog.path_for("awakening"),
            Some(PathBuf::from("/assets/awakening-melody.mp3"))
        );
        assert_eq!(catalog.ids().count(), 18);
    }

    #[test]
    fn playback_failure_is_swallowed() {
        let backend = Arc::new(MemoryBackend::new().failing("rain"));
        let registry = SoundRegistry::new(SoundCatalog::builtin("/assets"), backend.clone());
        let rain = registry.get("rain").unwrap();
        play_looped(rain.as_ref(), 40);
        let state = backend.state("rain").unwrap();
        assert!(!state.playing);
        assert_eq!(state.play_calls, 1);
    }

    #[test]
    fn shutdown_rewinds_everything() {
        let (backend, registry) = registry();
        play_looped(registry.get("rain").unwrap().as_ref(), 50);
        play_looped(registry.get("birds").unwrap().as_ref(), 50);
        registry.shutdown();
        for id in ["rain", "birds"] {
            let state = backend.state(id).unwrap();
            assert!(!state.playing);
            assert!(state.at_start);
        }
    }
}
