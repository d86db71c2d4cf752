//! The musical model: channels, patterns, notes, and the song itself.
//!
//! The `Song` is the single model store. Every mutation reaches it through
//! a journal command (see `history`); read paths return views combining
//! channel metadata with the current pattern's steps and notes.

pub mod arrangement;
pub mod synth;

pub use arrangement::{Arrangement, PatternPlacement, NUM_BARS};
pub use synth::SynthPatch;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Steps per pattern (sixteenths in one bar)
pub const NUM_STEPS: usize = 16;

// ============================================================================
// Notes
// ============================================================================

/// A note in the piano roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: String,
    /// MIDI pitch (0-127)
    pub pitch: u8,
    /// Starting step (0-15)
    pub start_step: usize,
    /// Duration in steps (1-16), start_step + duration <= 16
    pub duration: usize,
}

impl Note {
    /// Create a new note with an auto-generated ID, clamped into range
    pub fn new(pitch: u8, start_step: usize, duration: usize) -> Self {
        let start_step = start_step.min(NUM_STEPS - 1);
        Self {
            id: Uuid::new_v4().to_string(),
            pitch: pitch.min(127),
            start_step,
            duration: duration.clamp(1, NUM_STEPS - start_step),
        }
    }

    /// Check if this note covers a given step
    pub fn covers_step(&self, step: usize) -> bool {
        step >= self.start_step && step < self.start_step + self.duration
    }
}

// ============================================================================
// Channels
// ============================================================================

/// What a channel plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// One audio file, triggered by steps and pitched notes
    #[default]
    Sample,
    /// Patch-driven synth, triggered by notes only
    Synth,
}

/// A channel in the sequencer (e.g. Kick, Snare, Lead)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub kind: ChannelKind,
    /// Sample path relative to the project's samples root.
    /// Empty string = empty channel, which contributes silence.
    #[serde(default)]
    pub sample_ref: String,
    #[serde(default)]
    pub synth_patch: SynthPatch,
    pub muted: bool,
    pub solo: bool,
    /// Channel volume (0-100)
    pub volume: u8,
}

impl Channel {
    /// Create an empty sample channel
    pub fn sample(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ChannelKind::Sample,
            sample_ref: String::new(),
            synth_patch: SynthPatch::default(),
            muted: false,
            solo: false,
            volume: 80,
        }
    }

    /// Create a synth channel with a patch
    pub fn synth(name: &str, patch: SynthPatch) -> Self {
        Self {
            name: name.to_string(),
            kind: ChannelKind::Synth,
            sample_ref: String::new(),
            synth_patch: patch,
            muted: false,
            solo: false,
            volume: 80,
        }
    }

    /// A sample channel with no file assigned contributes silence
    pub fn is_empty_sample(&self) -> bool {
        self.kind == ChannelKind::Sample && self.sample_ref.is_empty()
    }

    /// Channel volume as a 0.0-1.0 gain
    pub fn gain(&self) -> f32 {
        self.volume.min(100) as f32 / 100.0
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::sample("New Channel")
    }
}

/// Default channel template for new projects
pub fn default_channels() -> Vec<Channel> {
    vec![
        Channel::sample("Kick"),
        Channel::sample("Snare"),
        Channel::sample("HiHat"),
        Channel::sample("OpenHat"),
        Channel::sample("Clap"),
        Channel::sample("Tom"),
        Channel::synth("Lead", SynthPatch::lead()),
        Channel::synth("Bass", SynthPatch::bass()),
    ]
}

// ============================================================================
// Patterns
// ============================================================================

/// A pattern: step grids and note sets across all channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: usize,
    pub name: String,
    /// Steps per channel - steps[channel][step]
    pub steps: Vec<Vec<bool>>,
    /// Notes per channel - notes[channel]
    #[serde(default)]
    pub notes: Vec<Vec<Note>>,
}

impl Pattern {
    pub fn new(id: usize, num_channels: usize) -> Self {
        Self {
            id,
            name: format!("Pattern {}", id + 1),
            steps: vec![vec![false; NUM_STEPS]; num_channels],
            notes: vec![Vec::new(); num_channels],
        }
    }

    /// A pattern is non-empty iff any step is on or any channel has notes
    pub fn is_empty(&self) -> bool {
        self.steps.iter().all(|row| row.iter().all(|s| !s))
            && self.notes.iter().all(|n| n.is_empty())
    }

    pub fn get_step(&self, channel: usize, step: usize) -> bool {
        self.steps
            .get(channel)
            .and_then(|row| row.get(step))
            .copied()
            .unwrap_or(false)
    }

    pub fn set_step(&mut self, channel: usize, step: usize, active: bool) {
        if let Some(cell) = self.steps.get_mut(channel).and_then(|row| row.get_mut(step)) {
            *cell = active;
        }
    }

    pub fn toggle_step(&mut self, channel: usize, step: usize) {
        let current = self.get_step(channel, step);
        self.set_step(channel, step, !current);
    }

    pub fn notes(&self, channel: usize) -> &[Note] {
        self.notes.get(channel).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn add_note(&mut self, channel: usize, note: Note) {
        if let Some(notes) = self.notes.get_mut(channel) {
            notes.push(note);
        }
    }

    /// Remove a note by ID from a channel
    pub fn remove_note(&mut self, channel: usize, note_id: &str) -> Option<Note> {
        let notes = self.notes.get_mut(channel)?;
        let idx = notes.iter().position(|n| n.id == note_id)?;
        Some(notes.remove(idx))
    }

    /// Find the note covering (pitch, step)
    pub fn note_at(&self, channel: usize, pitch: u8, step: usize) -> Option<&Note> {
        self.notes
            .get(channel)?
            .iter()
            .find(|n| n.pitch == pitch && n.covers_step(step))
    }

    /// Find the note starting exactly at (pitch, step)
    pub fn note_starting_at(&self, channel: usize, pitch: u8, step: usize) -> Option<&Note> {
        self.notes
            .get(channel)?
            .iter()
            .find(|n| n.pitch == pitch && n.start_step == step)
    }
}

// ============================================================================
// Yanked data types for the shared registers
// ============================================================================

/// Yanked note for piano roll copy/paste.
/// Offsets are relative to the yank anchor so paste works anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct YankedNote {
    /// Offset from the anchor pitch (can be negative)
    pub pitch_offset: i32,
    /// Offset from the anchor step
    pub step_offset: i32,
    pub duration: usize,
}

/// Yanked placement for playlist copy/paste
#[derive(Debug, Clone, PartialEq)]
pub struct YankedPlacement {
    /// Offset from the anchor bar
    pub bar_offset: i32,
    pub pattern_id: usize,
}

// ============================================================================
// Song - the model store
// ============================================================================

/// A view row combining channel metadata with the current pattern's data
#[derive(Debug, Clone)]
pub struct ChannelView<'a> {
    pub channel: &'a Channel,
    pub steps: &'a [bool],
    pub notes: &'a [Note],
    pub effectively_muted: bool,
}

/// The whole musical model
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub bpm: f64,
    pub channels: Vec<Channel>,
    pub patterns: Vec<Pattern>,
    pub current_pattern_id: usize,
    pub arrangement: Arrangement,
}

impl Song {
    /// A fresh song from the default template
    pub fn new(name: &str) -> Self {
        let channels = default_channels();
        let patterns = vec![Pattern::new(0, channels.len())];
        Self {
            name: name.to_string(),
            created_at: Utc::now(),
            bpm: 140.0,
            channels,
            patterns,
            current_pattern_id: 0,
            arrangement: Arrangement::new(),
        }
    }

    pub fn pattern(&self, id: usize) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    pub fn pattern_mut(&mut self, id: usize) -> Option<&mut Pattern> {
        self.patterns.iter_mut().find(|p| p.id == id)
    }

    /// Get the pattern, creating an empty one if the id doesn't exist yet
    pub fn pattern_or_create(&mut self, id: usize) -> &mut Pattern {
        if self.pattern(id).is_none() {
            let pattern = Pattern::new(id, self.channels.len());
            self.patterns.push(pattern);
            self.patterns.sort_by_key(|p| p.id);
        }
        self.pattern_mut(id).unwrap()
    }

    /// The current pattern. `current_pattern_id` always names an existing
    /// pattern, so this only fails on a corrupted model.
    pub fn current_pattern(&self) -> Option<&Pattern> {
        self.pattern(self.current_pattern_id)
    }

    /// Switch the current pattern; a not-yet-existent id creates an
    /// empty pattern with that id.
    pub fn switch_to_pattern(&mut self, id: usize) {
        self.pattern_or_create(id);
        self.current_pattern_id = id;
    }

    /// Create a new pattern after the highest existing id, returning its id
    pub fn create_pattern(&mut self) -> usize {
        let id = self.patterns.iter().map(|p| p.id + 1).max().unwrap_or(0);
        self.switch_to_pattern(id);
        id
    }

    /// Patterns with at least one active step or any note
    pub fn non_empty_patterns(&self) -> Vec<&Pattern> {
        self.patterns.iter().filter(|p| !p.is_empty()).collect()
    }

    /// Is any channel soloed?
    pub fn has_solo(&self) -> bool {
        self.channels.iter().any(|c| c.solo)
    }

    /// The soloed channel's index, if any (at most one by invariant)
    pub fn solo_channel(&self) -> Option<usize> {
        self.channels.iter().position(|c| c.solo)
    }

    /// A channel is effectively muted if it is muted, or another channel
    /// is soloed and this one is not.
    pub fn effectively_muted(&self, channel: usize) -> bool {
        let Some(ch) = self.channels.get(channel) else {
            return true;
        };
        ch.muted || (self.has_solo() && !ch.solo)
    }

    /// View rows for the channel rack: metadata x current pattern data
    pub fn channels_with_steps(&self) -> Vec<ChannelView<'_>> {
        static EMPTY_STEPS: [bool; NUM_STEPS] = [false; NUM_STEPS];
        let pattern = self.current_pattern();
        self.channels
            .iter()
            .enumerate()
            .map(|(idx, channel)| ChannelView {
                channel,
                steps: pattern
                    .and_then(|p| p.steps.get(idx))
                    .map(|row| row.as_slice())
                    .unwrap_or(&EMPTY_STEPS),
                notes: pattern.map(|p| p.notes(idx)).unwrap_or(&[]),
                effectively_muted: self.effectively_muted(idx),
            })
            .collect()
    }
}
