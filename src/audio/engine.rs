//! Audio engine: cpal output stream and voice mixing.
//!
//! Commands arrive over a crossbeam channel and are drained on the UI loop
//! by `process_commands` (decoding happens there, never in the callback).
//! The callback only locks the voice list and mixes.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{unbounded, Receiver};
use rodio::{Decoder, Source};

use super::voice::{SampleData, SampleVoice, SynthVoice};
use super::{AudioCommand, AudioHandle};

/// Maximum number of simultaneous voices
const MAX_VOICES: usize = 32;

/// Audio engine errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("unsupported output sample format")]
    UnsupportedFormat,
    #[error("audio stream error: {0}")]
    Stream(String),
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Voices shared between the UI thread and the audio callback
#[derive(Default)]
struct VoiceState {
    samples: Vec<SampleVoice>,
    synths: Vec<SynthVoice>,
    master_volume: f32,
}

/// Audio engine owning the output stream.
///
/// Created with `AudioEngine::new()`, which also returns the handle the
/// rest of the app uses to send commands.
pub struct AudioEngine {
    _stream: Stream,
    rx: Receiver<AudioCommand>,
    voices: Arc<Mutex<VoiceState>>,
    cache: HashMap<PathBuf, SampleData>,
    sample_rate: u32,
}

impl AudioEngine {
    /// Initialize the default output device and start the stream
    pub fn new() -> Result<(Self, AudioHandle), AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        if config.sample_format() != SampleFormat::F32 {
            return Err(AudioError::UnsupportedFormat);
        }

        let stream_config: StreamConfig = config.into();
        let sample_rate = stream_config.sample_rate.0;
        let channels = stream_config.channels as usize;

        let voices = Arc::new(Mutex::new(VoiceState {
            master_volume: 0.8,
            ..Default::default()
        }));
        let callback_voices = Arc::clone(&voices);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    mix_into(data, channels, &callback_voices);
                },
                |err| eprintln!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        let (tx, rx) = unbounded();
        let engine = Self {
            _stream: stream,
            rx,
            voices,
            cache: HashMap::new(),
            sample_rate,
        };

        Ok((engine, AudioHandle::for_stream(tx)))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Drain pending commands. Returns the non-fatal errors that occurred
    /// (decode failures etc.) so the caller can surface them; playback of
    /// the remaining commands continues regardless.
    pub fn process_commands(&mut self) -> Vec<AudioError> {
        let mut errors = Vec::new();
        while let Ok(cmd) = self.rx.try_recv() {
            if let Err(err) = self.handle_command(cmd) {
                errors.push(err);
            }
        }
        errors
    }

    fn handle_command(&mut self, cmd: AudioCommand) -> Result<(), AudioError> {
        match cmd {
            AudioCommand::TriggerSample { path, volume } => {
                let sample = self.load_sample(&path)?;
                let voice = SampleVoice::new(sample, None, volume, self.sample_rate, false);
                self.push_sample_voice(voice);
            }
            AudioCommand::TriggerSamplePitched {
                path,
                pitch,
                volume,
            } => {
                let sample = self.load_sample(&path)?;
                let voice = SampleVoice::new(sample, Some(pitch), volume, self.sample_rate, false);
                self.push_sample_voice(voice);
            }
            AudioCommand::TriggerSynth {
                patch,
                pitch,
                duration_secs,
                volume,
            } => {
                let voice = SynthVoice::new(
                    &patch,
                    pitch,
                    Some(duration_secs),
                    volume,
                    self.sample_rate,
                    false,
                );
                self.push_synth_voice(voice);
            }
            AudioCommand::PreviewSample { path } => {
                let sample = self.load_sample(&path)?;
                let voice = SampleVoice::new(sample, None, 0.8, self.sample_rate, true);
                self.stop_preview_voices();
                self.push_sample_voice(voice);
            }
            AudioCommand::PreviewSamplePitched { path, pitch } => {
                let sample = self.load_sample(&path)?;
                let voice = SampleVoice::new(sample, Some(pitch), 0.8, self.sample_rate, true);
                self.stop_preview_voices();
                self.push_sample_voice(voice);
            }
            AudioCommand::PreviewSynth { patch, pitch } => {
                let voice = SynthVoice::new(&patch, pitch, None, 0.8, self.sample_rate, true);
                self.stop_preview_voices();
                self.push_synth_voice(voice);
            }
            AudioCommand::StopPreview => {
                self.stop_preview_voices();
            }
            AudioCommand::StopAll => {
                let mut voices = self.voices.lock().unwrap();
                voices.samples.clear();
                voices.synths.clear();
            }
            AudioCommand::SetMasterVolume(volume) => {
                self.voices.lock().unwrap().master_volume = volume;
            }
            AudioCommand::PreloadSample { path } => {
                self.load_sample(&path)?;
            }
        }
        Ok(())
    }

    /// Remove preview sample voices; release preview synth voices so they
    /// fade via their envelope
    fn stop_preview_voices(&mut self) {
        let mut voices = self.voices.lock().unwrap();
        voices.samples.retain(|v| !v.is_preview);
        for synth in voices.synths.iter_mut().filter(|v| v.is_preview) {
            synth.release();
        }
    }

    fn push_sample_voice(&mut self, voice: SampleVoice) {
        let mut voices = self.voices.lock().unwrap();
        if voices.samples.len() >= MAX_VOICES {
            voices.samples.remove(0);
        }
        voices.samples.push(voice);
    }

    fn push_synth_voice(&mut self, voice: SynthVoice) {
        let mut voices = self.voices.lock().unwrap();
        if voices.synths.len() >= MAX_VOICES {
            voices.synths.remove(0);
        }
        voices.synths.push(voice);
    }

    /// Load a sample from the cache, decoding it on first use
    fn load_sample(&mut self, path: &Path) -> Result<SampleData, AudioError> {
        if let Some(sample) = self.cache.get(path) {
            return Ok(sample.clone());
        }

        let file = File::open(path).map_err(|e| AudioError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let sample_rate = decoder.sample_rate();
        let channels = decoder.channels();
        let data: Vec<f32> = decoder.convert_samples().collect();

        let sample = SampleData {
            data: Arc::new(data),
            sample_rate,
            channels,
        };
        self.cache.insert(path.to_path_buf(), sample.clone());
        Ok(sample)
    }
}

/// Mix all active voices into an interleaved output buffer
fn mix_into(data: &mut [f32], channels: usize, voices: &Arc<Mutex<VoiceState>>) {
    let Ok(mut voices) = voices.lock() else {
        data.iter_mut().for_each(|s| *s = 0.0);
        return;
    };
    let master = voices.master_volume;

    for frame in data.chunks_mut(channels.max(1)) {
        let mut left = 0.0f32;
        let mut right = 0.0f32;

        voices.samples.retain_mut(|voice| match voice.next_frame() {
            Some((l, r)) => {
                left += l;
                right += r;
                true
            }
            None => false,
        });

        voices.synths.retain_mut(|voice| match voice.next_sample() {
            Some(s) => {
                left += s;
                right += s;
                true
            }
            None => false,
        });

        left = (left * master).clamp(-1.0, 1.0);
        right = (right * master).clamp(-1.0, 1.0);

        for (idx, out) in frame.iter_mut().enumerate() {
            *out = match idx {
                0 => left,
                1 => right,
                _ => left,
            };
        }
    }
}
