//! Context traits for input handlers.
//!
//! These traits define the minimal data interfaces the vim glue needs from
//! a grid: read a range, delete a range, insert at a position. `App`
//! implements them; tests can use mock implementations.

use crate::song::Note;

// ============================================================================
// Step Grid Context (channel rack)
// ============================================================================

/// Step sequencer data access for the channel rack
pub trait StepGridContext {
    /// Number of channel rows
    fn channel_count(&self) -> usize;

    /// Step state at (channel, step)
    fn get_step(&self, channel: usize, step: usize) -> bool;

    /// Steps for a rectangle of channels x steps
    fn get_step_range(
        &self,
        channels: std::ops::Range<usize>,
        steps: std::ops::Range<usize>,
    ) -> Vec<Vec<bool>> {
        channels
            .map(|ch| steps.clone().map(|st| self.get_step(ch, st)).collect())
            .collect()
    }
}

// ============================================================================
// Piano Roll Context (note editing)
// ============================================================================

/// Note data access for the focused channel/pattern
pub trait PianoRollContext {
    /// All notes for the focused channel and pattern
    fn notes(&self) -> &[Note];

    /// Find the note covering (pitch, step)
    fn note_at(&self, pitch: u8, step: usize) -> Option<&Note> {
        self.notes()
            .iter()
            .find(|n| n.pitch == pitch && n.covers_step(step))
    }

    /// Find the note starting exactly at (pitch, step)
    fn note_starting_at(&self, pitch: u8, step: usize) -> Option<&Note> {
        self.notes()
            .iter()
            .find(|n| n.pitch == pitch && n.start_step == step)
    }

    /// Notes overlapping a pitch/step rectangle
    fn notes_in_range(
        &self,
        pitch_range: std::ops::RangeInclusive<u8>,
        step_range: std::ops::Range<usize>,
    ) -> Vec<&Note> {
        self.notes()
            .iter()
            .filter(|n| {
                pitch_range.contains(&n.pitch) && step_range.clone().any(|s| n.covers_step(s))
            })
            .collect()
    }
}

// ============================================================================
// Playlist Context (arrangement editing)
// ============================================================================

/// Placement data access for the playlist
pub trait PlaylistContext {
    /// Pattern rows currently surfaced (non-empty patterns)
    fn pattern_row_ids(&self) -> Vec<usize>;

    /// Check if a placement starts at (pattern_id, bar)
    fn has_placement(&self, pattern_id: usize, bar: usize) -> bool;
}
