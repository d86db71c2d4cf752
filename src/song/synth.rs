//! Synth patch data: oscillators, envelope, filter.
//!
//! Patches are part of the musical model (they persist with the project);
//! the audio engine builds voices from them.

use serde::{Deserialize, Serialize};

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A single oscillator in a patch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    pub enabled: bool,
    pub waveform: Waveform,
    /// Coarse tune in semitones (-24 to 24)
    pub coarse: i8,
    /// Fine tune in cents (-100 to 100)
    pub fine: i8,
    /// Oscillator volume (0.0-1.0)
    pub volume: f32,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            enabled: false,
            waveform: Waveform::Sine,
            coarse: 0,
            fine: 0,
            volume: 0.8,
        }
    }
}

impl OscillatorParams {
    /// Frequency for a MIDI pitch with this oscillator's tuning applied:
    /// 440 * 2^((pitch + coarse + fine/100 - 69) / 12)
    pub fn frequency(&self, pitch: u8) -> f32 {
        let semitones = pitch as f32 + self.coarse as f32 + self.fine as f32 / 100.0 - 69.0;
        440.0 * 2f32.powf(semitones / 12.0)
    }
}

/// ADSR envelope, times in seconds, sustain as a level (0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.2,
        }
    }
}

/// Per-voice filter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    LowPass,
    HighPass,
    BandPass,
}

/// Per-voice filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub kind: FilterKind,
    pub cutoff_hz: f32,
    /// Resonance (0.0-1.0); higher = more peak at the cutoff
    pub resonance: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            kind: FilterKind::LowPass,
            cutoff_hz: 4000.0,
            resonance: 0.2,
        }
    }
}

/// Maximum oscillators per patch
pub const NUM_OSCILLATORS: usize = 3;

/// A complete synth patch: up to 3 oscillators, an envelope and an
/// optional filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthPatch {
    pub oscillators: [OscillatorParams; NUM_OSCILLATORS],
    pub envelope: Adsr,
    #[serde(default)]
    pub filter: Option<FilterParams>,
}

impl Default for SynthPatch {
    fn default() -> Self {
        let mut oscillators = [OscillatorParams::default(); NUM_OSCILLATORS];
        oscillators[0].enabled = true;
        Self {
            oscillators,
            envelope: Adsr::default(),
            filter: None,
        }
    }
}

impl SynthPatch {
    /// A simple saw lead with a lowpass filter
    pub fn lead() -> Self {
        let mut patch = Self::default();
        patch.oscillators[0].waveform = Waveform::Sawtooth;
        patch.oscillators[1] = OscillatorParams {
            enabled: true,
            waveform: Waveform::Sawtooth,
            coarse: 0,
            fine: 12,
            volume: 0.5,
        };
        patch.filter = Some(FilterParams {
            kind: FilterKind::LowPass,
            cutoff_hz: 3500.0,
            resonance: 0.3,
        });
        patch
    }

    /// A square bass an octave down
    pub fn bass() -> Self {
        let mut patch = Self::default();
        patch.oscillators[0].waveform = Waveform::Square;
        patch.oscillators[0].coarse = -12;
        patch.envelope = Adsr {
            attack: 0.005,
            decay: 0.15,
            sustain: 0.5,
            release: 0.1,
        };
        patch.filter = Some(FilterParams {
            kind: FilterKind::LowPass,
            cutoff_hz: 1200.0,
            resonance: 0.25,
        });
        patch
    }

    /// Enabled oscillators in slot order
    pub fn enabled_oscillators(&self) -> impl Iterator<Item = &OscillatorParams> {
        self.oscillators.iter().filter(|o| o.enabled)
    }
}
