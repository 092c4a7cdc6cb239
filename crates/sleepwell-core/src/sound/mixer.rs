//! Several ambient sounds looping at once, each with its own volume.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::{percent_to_volume, play_looped, stop, SoundRegistry};
use crate::error::ValidationError;

pub const DEFAULT_CHANNEL_VOLUME: u8 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MixerChannel {
    pub id: String,
    pub volume_percent: u8,
}

#[derive(Debug)]
pub struct SoundMixer {
    registry: Arc<SoundRegistry>,
    channels: Vec<MixerChannel>,
    touched: BTreeSet<String>,
}

impl SoundMixer {
    pub fn new(registry: Arc<SoundRegistry>) -> Self {
        Self {
            registry,
            channels: Vec::new(),
            touched: BTreeSet::new(),
        }
    }

    pub fn playing(&self) -> &[MixerChannel] {
        &self.channels
    }

    pub fn is_playing(&self, id: &str) -> bool {
        self.channels.iter().any(|c| c.id == id)
    }

    /// Volume of a playing channel, or the default for one that is not.
    pub fn volume(&self, id: &str) -> u8 {
        self.channels
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.volume_percent)
            .unwrap_or(DEFAULT_CHANNEL_VOLUME)
    }

    /// Start `id` if silent, stop and rewind it if playing. Returns whether
    /// it is playing afterwards.
    pub fn toggle(&mut self, id: &str) -> Result<bool, ValidationError> {
        let handle = self.registry.get(id).ok_or_else(|| ValidationError::UnknownId {
            kind: "sound".into(),
            id: id.to_string(),
        })?;

        if let Some(pos) = self.channels.iter().position(|c| c.id == id) {
            self.channels.remove(pos);
            stop(handle.as_ref());
            return Ok(false);
        }

        self.channels.push(MixerChannel {
            id: id.to_string(),
            volume_percent: DEFAULT_CHANNEL_VOLUME,
        });
        self.touched.insert(id.to_string());
        play_looped(handle.as_ref(), DEFAULT_CHANNEL_VOLUME);
        Ok(true)
    }

    /// Returns `false` if `id` is not playing.
    pub fn set_volume(&mut self, id: &str, percent: u8) -> bool {
        let percent = percent.min(100);
        let Some(channel) = self.channels.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        channel.volume_percent = percent;
        if let Some(handle) = self.registry.get(id) {
            handle.set_volume(percent_to_volume(percent));
        }
        true
    }

    /// Stop and rewind every sound this mixer ever started.
    pub fn stop_all(&mut self) {
        for id in &self.touched {
            if let Some(handle) = self.registry.get(id) {
                stop(handle.as_ref());
            }
        }
        self.channels.clear();
    }
}

impl Drop for SoundMixer {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{MemoryBackend, SoundCatalog};

    fn mixer() -> (Arc<MemoryBackend>, SoundMixer) {
        let backend = Arc::new(MemoryBackend::new());
        let registry = Arc::new(SoundRegistry::new(
            SoundCatalog::builtin("/assets"),
            backend.clone(),
        ));
        (backend, SoundMixer::new(registry))
    }

    #[test]
    fn toggle_starts_then_stops() {
        let (backend, mut mixer) = mixer();
        assert!(mixer.toggle("rain").unwrap());
        let state = backend.state("rain").unwrap();
        assert!(state.playing && state.looping);
        assert_eq!(state.volume, 0.5);

        assert!(!mixer.toggle("rain").unwrap());
        let state = backend.state("rain").unwrap();
        assert!(!state.playing && state.at_start);
        assert!(mixer.playing().is_empty());
    }

    #[test]
    fn volumes_are_tracked_per_channel() {
        let (backend, mut mixer) = mixer();
        mixer.toggle("rain").unwrap();
        mixer.toggle("fire").unwrap();
        assert!(mixer.set_volume("fire", 80));
        assert!(!mixer.set_volume("wind", 80));
        assert_eq!(mixer.volume("fire"), 80);
        assert_eq!(mixer.volume("rain"), 50);
        assert_eq!(mixer.volume("wind"), DEFAULT_CHANNEL_VOLUME);
        assert_eq!(backend.state("fire").unwrap().volume, 0.8);
    }

    #[test]
    fn stop_all_rewinds_everything() {
        let (backend, mut mixer) = mixer();
        mixer.toggle("rain").unwrap();
        mixer.toggle("ocean").unwrap();
        mixer.stop_all();
        assert!(mixer.playing().is_empty());
        for id in ["rain", "ocean"] {
            let state = backend.state(id).unwrap();
            assert!(!state.playing && state.at_start);
        }
    }

    #[test]
    fn unknown_sound_is_rejected() {
        let (_, mut mixer) = mixer();
        assert!(mixer.toggle("bagpipes").is_err());
        assert!(mixer.toggle("none").is_err());
    }
}
