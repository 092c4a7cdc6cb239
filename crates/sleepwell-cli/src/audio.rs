//! Audio output selection.
//!
//! With the `playback` feature (on by default) the sounds go to the default
//! output device through rodio. Without it, with `--mute`, or when no device
//! can be opened, the silent in-memory backend stands in.

use std::sync::Arc;

use sleepwell_core::sound::{AudioBackend, MemoryBackend};

/// Owns the output stream for as long as sounds may play.
pub struct AudioOutput {
    backend: Arc<dyn AudioBackend>,
    #[cfg(feature = "playback")]
    _stream: Option<rodio::OutputStream>,
}

impl AudioOutput {
    pub fn open(mute: bool) -> Self {
        if mute {
            return Self::silent();
        }
        #[cfg(feature = "playback")]
        {
            match rodio::OutputStream::try_default() {
                Ok((stream, handle)) => {
                    return Self {
                        backend: Arc::new(rodio_backend::RodioBackend::new(handle)),
                        _stream: Some(stream),
                    };
                }
                Err(e) => tracing::warn!("no audio output device, continuing silently: {e}"),
            }
        }
        #[cfg(not(feature = "playback"))]
        tracing::info!("built without audio playback, sounds are silent");
        Self::silent()
    }

    fn silent() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
            #[cfg(feature = "playback")]
            _stream: None,
        }
    }

    pub fn backend(&self) -> Arc<dyn AudioBackend> {
        Arc::clone(&self.backend)
    }
}

#[cfg(feature = "playback")]
mod rodio_backend {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use rodio::{Decoder, OutputStreamHandle, Sink, Source};
    use sleepwell_core::sound::{AudioBackend, AudioHandle, SoundHandle};
    use sleepwell_core::PlaybackError;

    pub struct RodioBackend {
        stream: OutputStreamHandle,
    }

    impl RodioBackend {
        pub fn new(stream: OutputStreamHandle) -> Self {
            Self { stream }
        }
    }

    impl AudioBackend for RodioBackend {
        fn open(&self, _id: &str, path: &Path) -> SoundHandle {
            std::sync::Arc::new(RodioHandle {
                path: path.to_path_buf(),
                stream: self.stream.clone(),
                state: Mutex::new(State {
                    sink: None,
                    looping: false,
                    volume: 1.0,
                }),
            })
        }
    }

    struct State {
        /// `None` until first played and after a rewind.
        sink: Option<Sink>,
        looping: bool,
        volume: f32,
    }

    pub struct RodioHandle {
        path: PathBuf,
        stream: OutputStreamHandle,
        state: Mutex<State>,
    }

    impl RodioHandle {
        fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
            let mut guard = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            f(&mut guard)
        }

        fn load(&self, looping: bool, volume: f32) -> Result<Sink, PlaybackError> {
            let file = File::open(&self.path).map_err(|_| PlaybackError::AssetMissing(self.path.clone()))?;
            let source = Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
            let sink = Sink::try_new(&self.stream).map_err(|e| PlaybackError::Blocked(e.to_string()))?;
            sink.pause();
            sink.set_volume(volume);
            if looping {
                sink.append(source.repeat_infinite());
            } else {
                sink.append(source);
            }
            Ok(sink)
        }
    }

    impl AudioHandle for RodioHandle {
        fn play(&self) -> Result<(), PlaybackError> {
            self.with_state(|state| {
                let finished = state.sink.as_ref().map_or(true, Sink::empty);
                if finished {
                    state.sink = Some(self.load(state.looping, state.volume)?);
                }
                if let Some(sink) = &state.sink {
                    sink.play();
                }
                Ok(())
            })
        }

        fn pause(&self) {
            self.with_state(|state| {
                if let Some(sink) = &state.sink {
                    sink.pause();
                }
            });
        }

        fn set_loop(&self, looping: bool) {
            self.with_state(|state| {
                if state.looping != looping {
                    state.looping = looping;
                    // The queued source was built for the old mode.
                    state.sink = None;
                }
            });
        }

        fn set_volume(&self, volume: f32) {
            self.with_state(|state| {
                state.volume = volume.clamp(0.0, 1.0);
                if let Some(sink) = &state.sink {
                    sink.set_volume(state.volume);
                }
            });
        }

        fn seek_to_start(&self) {
            self.with_state(|state| {
                if let Some(sink) = state.sink.take() {
                    sink.stop();
                }
            });
        }

        fn is_playing(&self) -> bool {
            self.with_state(|state| {
                state
                    .sink
                    .as_ref()
                    .is_some_and(|sink| !sink.is_paused() && !sink.empty())
            })
        }
    }
}
