//! Audio command channel and engine.
//!
//! The UI thread talks to the audio thread exclusively through
//! `AudioCommand`s sent over a crossbeam channel. `AudioHandle` is the
//! sending side; `AudioEngine` (see `engine`) owns the cpal stream and
//! drains the channel in the output callback.
//!
//! For tests, `AudioHandle::capture()` records commands instead of sending
//! them anywhere, so scheduler behavior can be asserted without audio
//! hardware.

pub mod engine;
pub mod voice;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;

use crate::song::synth::SynthPatch;

/// Commands sent to the audio engine
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// Polyphonic one-shot of a decoded sample buffer
    TriggerSample { path: PathBuf, volume: f32 },
    /// Sample playback with rate 2^((pitch-60)/12)
    TriggerSamplePitched {
        path: PathBuf,
        pitch: u8,
        volume: f32,
    },
    /// Build a synth voice from a patch
    TriggerSynth {
        patch: SynthPatch,
        pitch: u8,
        duration_secs: f32,
        volume: f32,
    },
    /// Preview a sample (exclusive - stops the previous preview)
    PreviewSample { path: PathBuf },
    /// Preview a sample at a pitch (exclusive)
    PreviewSamplePitched { path: PathBuf, pitch: u8 },
    /// Preview a synth patch at a pitch (exclusive)
    PreviewSynth { patch: SynthPatch, pitch: u8 },
    /// Stop the current preview
    StopPreview,
    /// Stop all playback
    StopAll,
    /// Set master volume (0.0-1.0)
    SetMasterVolume(f32),
    /// Load a sample into the cache ahead of playback
    PreloadSample { path: PathBuf },
}

/// Where commands go: a real engine or a test capture buffer
#[derive(Clone)]
enum AudioSink {
    Stream(Sender<AudioCommand>),
    Capture(Arc<Mutex<Vec<AudioCommand>>>),
}

/// Handle for sending commands to the audio engine.
///
/// Cloneable; all clones feed the same engine (or capture buffer).
#[derive(Clone)]
pub struct AudioHandle {
    sink: AudioSink,
}

impl AudioHandle {
    /// Handle feeding a real engine's command channel
    pub(crate) fn for_stream(tx: Sender<AudioCommand>) -> Self {
        Self {
            sink: AudioSink::Stream(tx),
        }
    }

    /// Handle that records commands for inspection in tests
    pub fn capture() -> Self {
        Self {
            sink: AudioSink::Capture(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    fn send(&self, cmd: AudioCommand) {
        match &self.sink {
            AudioSink::Stream(tx) => {
                let _ = tx.send(cmd);
            }
            AudioSink::Capture(buffer) => {
                buffer.lock().unwrap().push(cmd);
            }
        }
    }

    pub fn trigger_sample(&self, path: &Path, volume: f32) {
        self.send(AudioCommand::TriggerSample {
            path: path.to_path_buf(),
            volume,
        });
    }

    pub fn trigger_sample_pitched(&self, path: &Path, pitch: u8, volume: f32) {
        self.send(AudioCommand::TriggerSamplePitched {
            path: path.to_path_buf(),
            pitch,
            volume,
        });
    }

    pub fn trigger_synth(&self, patch: &SynthPatch, pitch: u8, duration_secs: f32, volume: f32) {
        self.send(AudioCommand::TriggerSynth {
            patch: patch.clone(),
            pitch,
            duration_secs,
            volume,
        });
    }

    pub fn preview_sample(&self, path: &Path) {
        self.send(AudioCommand::PreviewSample {
            path: path.to_path_buf(),
        });
    }

    pub fn preview_sample_pitched(&self, path: &Path, pitch: u8) {
        self.send(AudioCommand::PreviewSamplePitched {
            path: path.to_path_buf(),
            pitch,
        });
    }

    pub fn preview_synth(&self, patch: &SynthPatch, pitch: u8) {
        self.send(AudioCommand::PreviewSynth {
            patch: patch.clone(),
            pitch,
        });
    }

    pub fn stop_preview(&self) {
        self.send(AudioCommand::StopPreview);
    }

    pub fn stop_all(&self) {
        self.send(AudioCommand::StopAll);
    }

    pub fn set_master_volume(&self, volume: f32) {
        self.send(AudioCommand::SetMasterVolume(volume.clamp(0.0, 1.0)));
    }

    pub fn preload_sample(&self, path: &Path) {
        self.send(AudioCommand::PreloadSample {
            path: path.to_path_buf(),
        });
    }

    // ========================================================================
    // Capture inspection (tests)
    // ========================================================================

    /// All captured commands (empty for a stream handle)
    pub fn captured(&self) -> Vec<AudioCommand> {
        match &self.sink {
            AudioSink::Capture(buffer) => buffer.lock().unwrap().clone(),
            AudioSink::Stream(_) => Vec::new(),
        }
    }

    /// The last captured command, if any
    pub fn last_captured(&self) -> Option<AudioCommand> {
        self.captured().into_iter().last()
    }

    /// Drop all captured commands
    pub fn clear_captured(&self) {
        if let AudioSink::Capture(buffer) = &self.sink {
            buffer.lock().unwrap().clear();
        }
    }

    /// Check if a matching command was captured
    pub fn has_captured<F>(&self, predicate: F) -> bool
    where
        F: Fn(&AudioCommand) -> bool,
    {
        self.captured().iter().any(predicate)
    }
}
