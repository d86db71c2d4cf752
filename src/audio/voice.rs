//! Playing voices: decoded sample instances and synth voices.

use std::f32::consts::PI;
use std::sync::Arc;

use crate::song::synth::{Adsr, FilterKind, FilterParams, SynthPatch, Waveform};

/// A decoded sample: interleaved frames plus format info
#[derive(Clone)]
pub struct SampleData {
    /// Interleaved samples (f32)
    pub data: Arc<Vec<f32>>,
    /// Sample rate of the source file
    pub sample_rate: u32,
    /// Number of interleaved channels (1 or 2)
    pub channels: u16,
}

impl SampleData {
    fn frame_count(&self) -> usize {
        self.data.len() / self.channels.max(1) as usize
    }

    fn frame(&self, idx: usize) -> (f32, f32) {
        let ch = self.channels.max(1) as usize;
        let base = idx * ch;
        let left = self.data.get(base).copied().unwrap_or(0.0);
        let right = if ch > 1 {
            self.data.get(base + 1).copied().unwrap_or(left)
        } else {
            left
        };
        (left, right)
    }
}

/// A playing sample instance
pub struct SampleVoice {
    sample: SampleData,
    /// Fractional read position in frames
    position: f64,
    /// Playback rate: pitch ratio x samplerate conversion
    rate: f64,
    volume: f32,
    pub is_preview: bool,
}

impl SampleVoice {
    /// Start a sample voice. `pitch` of None plays at the file's own pitch;
    /// Some(p) plays at rate 2^((p-60)/12) relative to middle C.
    pub fn new(
        sample: SampleData,
        pitch: Option<u8>,
        volume: f32,
        output_rate: u32,
        is_preview: bool,
    ) -> Self {
        let pitch_rate = pitch
            .map(|p| 2f64.powf((p as f64 - 60.0) / 12.0))
            .unwrap_or(1.0);
        let rate = pitch_rate * sample.sample_rate as f64 / output_rate.max(1) as f64;
        Self {
            sample,
            position: 0.0,
            rate,
            volume,
            is_preview,
        }
    }

    /// Next stereo frame with linear interpolation; None when the sample
    /// has played out.
    pub fn next_frame(&mut self) -> Option<(f32, f32)> {
        let frames = self.sample.frame_count();
        let idx = self.position as usize;
        if idx + 1 >= frames {
            return None;
        }

        let frac = (self.position - idx as f64) as f32;
        let (l0, r0) = self.sample.frame(idx);
        let (l1, r1) = self.sample.frame(idx + 1);
        let left = (l0 + (l1 - l0) * frac) * self.volume;
        let right = (r0 + (r1 - r0) * frac) * self.volume;

        self.position += self.rate;
        Some((left, right))
    }
}

// ============================================================================
// Synth voice
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    Done,
}

/// One oscillator's runtime state
struct OscState {
    frequency: f32,
    phase: f32,
    waveform: Waveform,
    volume: f32,
}

impl OscState {
    fn sample(&self) -> f32 {
        let value = match self.waveform {
            Waveform::Sine => (self.phase * 2.0 * PI).sin(),
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
        };
        value * self.volume
    }

    fn advance(&mut self, sample_rate: f32) {
        self.phase += self.frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }
}

/// State-variable filter state (Chamberlin form)
#[derive(Debug, Clone, Copy, Default)]
struct SvfState {
    low: f32,
    band: f32,
}

impl SvfState {
    fn process(&mut self, input: f32, g: f32, k: f32, kind: FilterKind) -> f32 {
        if !self.band.is_finite() {
            self.band = 0.0;
        }
        if !self.low.is_finite() {
            self.low = 0.0;
        }

        let high = input - k * self.band - self.low;
        self.band += g * high;
        self.low += g * self.band;

        let output = match kind {
            FilterKind::LowPass => self.low,
            FilterKind::HighPass => high,
            FilterKind::BandPass => self.band,
        };

        if output.is_finite() {
            output
        } else {
            0.0
        }
    }
}

/// A synthesized voice built from a patch
pub struct SynthVoice {
    oscillators: Vec<OscState>,
    envelope: Adsr,
    stage: EnvelopeStage,
    level: f32,
    /// Level at the moment release started, for a linear ramp to zero
    release_from: f32,
    filter: Option<(FilterParams, SvfState)>,
    sample_rate: f32,
    /// Samples until the gate closes; None sustains until release()
    gate_remaining: Option<u64>,
    volume: f32,
    pub is_preview: bool,
}

impl SynthVoice {
    /// Build a voice from a patch. `duration_secs` of None (previews)
    /// sustains until `release()` is called.
    pub fn new(
        patch: &SynthPatch,
        pitch: u8,
        duration_secs: Option<f32>,
        volume: f32,
        sample_rate: u32,
        is_preview: bool,
    ) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        let oscillators = patch
            .enabled_oscillators()
            .map(|osc| OscState {
                frequency: osc.frequency(pitch),
                phase: 0.0,
                waveform: osc.waveform,
                volume: osc.volume.clamp(0.0, 1.0),
            })
            .collect();

        Self {
            oscillators,
            envelope: patch.envelope,
            stage: EnvelopeStage::Attack,
            level: 0.0,
            release_from: 0.0,
            filter: patch.filter.map(|params| (params, SvfState::default())),
            sample_rate,
            gate_remaining: duration_secs.map(|secs| (secs.max(0.0) * sample_rate) as u64),
            volume,
            is_preview,
        }
    }

    /// Enter the release stage (gate closed externally)
    pub fn release(&mut self) {
        if self.stage != EnvelopeStage::Release && self.stage != EnvelopeStage::Done {
            self.release_from = self.level;
            self.stage = EnvelopeStage::Release;
        }
    }

    pub fn is_done(&self) -> bool {
        self.stage == EnvelopeStage::Done
    }

    fn advance_envelope(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Attack => {
                let attack_samples = (self.envelope.attack * self.sample_rate).max(1.0);
                self.level += 1.0 / attack_samples;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                let decay_samples = (self.envelope.decay * self.sample_rate).max(1.0);
                let sustain = self.envelope.sustain.clamp(0.0, 1.0);
                self.level -= (1.0 - sustain) / decay_samples;
                if self.level <= sustain {
                    self.level = sustain;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {}
            EnvelopeStage::Release => {
                let release_samples = (self.envelope.release * self.sample_rate).max(1.0);
                self.level -= self.release_from.max(0.001) / release_samples;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Done;
                }
            }
            EnvelopeStage::Done => {}
        }
        self.level
    }

    /// Next mono sample; None once the release has finished
    pub fn next_sample(&mut self) -> Option<f32> {
        if self.stage == EnvelopeStage::Done {
            return None;
        }

        // Close the gate when the note duration elapses
        if let Some(remaining) = &mut self.gate_remaining {
            if *remaining == 0 {
                self.release();
            } else {
                *remaining -= 1;
            }
        }

        let level = self.advance_envelope();
        if self.stage == EnvelopeStage::Done {
            return None;
        }

        let mut mixed = 0.0;
        for osc in &mut self.oscillators {
            mixed += osc.sample();
            osc.advance(self.sample_rate);
        }

        if let Some((params, state)) = &mut self.filter {
            let cutoff = params.cutoff_hz.clamp(20.0, self.sample_rate * 0.45);
            let g = (2.0 * (PI * cutoff / self.sample_rate).sin()).min(1.0);
            // Damping from resonance: 0 resonance = Butterworth, 1 = ringing
            let k = (1.414 * (1.0 - params.resonance.clamp(0.0, 1.0))).max(0.1);
            mixed = state.process(mixed, g, k, params.kind);
        }

        Some(mixed * level * self.volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::synth::OscillatorParams;

    fn mono_sample(frames: usize, rate: u32) -> SampleData {
        SampleData {
            data: Arc::new(vec![0.5; frames]),
            sample_rate: rate,
            channels: 1,
        }
    }

    #[test]
    fn test_sample_voice_plays_out() {
        let mut voice = SampleVoice::new(mono_sample(100, 44100), None, 1.0, 44100, false);
        let mut count = 0;
        while voice.next_frame().is_some() {
            count += 1;
        }
        assert_eq!(count, 99); // interpolation needs a next frame
    }

    #[test]
    fn test_pitched_voice_consumes_faster() {
        // One octave up = double rate = half the output frames
        let mut normal = SampleVoice::new(mono_sample(200, 44100), Some(60), 1.0, 44100, false);
        let mut octave_up = SampleVoice::new(mono_sample(200, 44100), Some(72), 1.0, 44100, false);

        let normal_frames = std::iter::from_fn(|| normal.next_frame()).count();
        let up_frames = std::iter::from_fn(|| octave_up.next_frame()).count();

        assert!((normal_frames as f64 / up_frames as f64 - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_mono_sample_copies_to_both_channels() {
        let mut voice = SampleVoice::new(mono_sample(10, 44100), None, 1.0, 44100, false);
        let (left, right) = voice.next_frame().unwrap();
        assert_eq!(left, right);
    }

    fn test_patch() -> SynthPatch {
        let mut patch = SynthPatch::default();
        patch.oscillators[0] = OscillatorParams {
            enabled: true,
            waveform: Waveform::Sine,
            coarse: 0,
            fine: 0,
            volume: 1.0,
        };
        patch.envelope = Adsr {
            attack: 0.001,
            decay: 0.001,
            sustain: 0.8,
            release: 0.01,
        };
        patch
    }

    #[test]
    fn test_synth_voice_finishes_after_duration_and_release() {
        let mut voice = SynthVoice::new(&test_patch(), 60, Some(0.01), 1.0, 44100, false);
        let samples = std::iter::from_fn(|| voice.next_sample()).count();

        // ~0.01s gate + ~0.01s release at 44100
        assert!(samples > 441 && samples < 2000, "got {samples}");
        assert!(voice.is_done());
    }

    #[test]
    fn test_preview_voice_sustains_until_release() {
        let mut voice = SynthVoice::new(&test_patch(), 60, None, 1.0, 44100, true);
        for _ in 0..10_000 {
            assert!(voice.next_sample().is_some());
        }
        voice.release();
        let tail = std::iter::from_fn(|| voice.next_sample()).count();
        assert!(tail < 1000);
    }

    #[test]
    fn test_synth_voice_produces_signal() {
        let mut voice = SynthVoice::new(&test_patch(), 69, Some(0.1), 1.0, 44100, false);
        let mut peak: f32 = 0.0;
        for _ in 0..4410 {
            if let Some(s) = voice.next_sample() {
                peak = peak.max(s.abs());
            }
        }
        assert!(peak > 0.1);
    }

    #[test]
    fn test_disabled_oscillators_are_skipped() {
        let mut patch = test_patch();
        patch.oscillators[0].enabled = false;
        let voice = SynthVoice::new(&patch, 60, Some(0.1), 1.0, 44100, false);
        assert!(voice.oscillators.is_empty());
    }
}
