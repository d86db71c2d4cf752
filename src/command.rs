//! Application command pattern.
//!
//! Input handlers produce `AppCommand`s, which are dispatched through
//! `App::dispatch()`. Undoable commands are lowered onto journal `EditOp`s
//! there; transport and pattern-selection commands apply directly. This
//! keeps mutation logic centralized and the handlers testable.

use crate::history::command::NoteChange;

/// All state mutations the input layer can request
#[derive(Debug, Clone)]
pub enum AppCommand {
    // ========================================================================
    // Transport (not undoable)
    // ========================================================================
    /// Toggle playback (pattern or arrangement based on focus)
    TogglePlayback,

    /// Stop playback without resetting the playhead
    StopPlayback,

    // ========================================================================
    // Pattern selection (not undoable)
    // ========================================================================
    /// Switch to the previous pattern
    PreviousPattern,

    /// Switch to the next pattern (creates it at the end)
    NextPattern,

    /// Create a new pattern after the highest id
    CreatePattern,

    /// Switch to a pattern id, creating it if missing
    SwitchPattern(usize),

    // ========================================================================
    // Journaled edits
    // ========================================================================
    /// Set tempo in BPM (clamped to 20-999)
    SetBpm(f64),

    /// Toggle a single step
    ToggleStep {
        pattern: usize,
        channel: usize,
        step: usize,
    },

    /// Write a slice of steps (paste), clipped at the pattern end
    SetSteps {
        pattern: usize,
        channel: usize,
        start: usize,
        values: Vec<bool>,
    },

    /// Clear steps in an inclusive range (vim delete)
    ClearStepRange {
        pattern: usize,
        channel: usize,
        start: usize,
        end: usize,
    },

    /// Clear a channel's whole row
    ClearChannel { pattern: usize, channel: usize },

    /// Flip a channel's mute flag
    ToggleMute(usize),

    /// Cycle channel state: clean -> muted -> solo -> clean
    CycleChannelMuteState(usize),

    /// Assign a sample to a channel (name derived from the file stem)
    SetChannelSample { channel: usize, path: String },

    /// Add a note to the piano roll
    AddNote {
        pattern: usize,
        channel: usize,
        pitch: u8,
        start_step: usize,
        duration: usize,
    },

    /// Remove a note by id
    RemoveNote {
        pattern: usize,
        channel: usize,
        note_id: String,
    },

    /// Merge changed fields into a note
    UpdateNote {
        pattern: usize,
        channel: usize,
        note_id: String,
        change: NoteChange,
    },

    /// Add a note at (pitch, start) or remove the one already there
    ToggleNote {
        pattern: usize,
        channel: usize,
        pitch: u8,
        start_step: usize,
        duration: usize,
    },

    /// Toggle a placement on the arrangement timeline
    TogglePlacement { pattern_id: usize, bar: usize },

    /// Add placements at (pattern_id, bar) positions (paste)
    AddPlacements { positions: Vec<(usize, usize)> },

    /// Remove a pattern's placements in a bar range (vim delete)
    RemovePlacements {
        pattern_id: usize,
        start_bar: usize,
        end_bar: usize,
    },

    /// Toggle a pattern's mute on the timeline
    TogglePatternMute(usize),
}

impl AppCommand {
    /// Whether this command is recorded in the journal
    pub fn is_undoable(&self) -> bool {
        !matches!(
            self,
            AppCommand::TogglePlayback
                | AppCommand::StopPlayback
                | AppCommand::PreviousPattern
                | AppCommand::NextPattern
                | AppCommand::CreatePattern
                | AppCommand::SwitchPattern(_)
        )
    }

    /// Short description for the event log
    pub fn description(&self) -> &'static str {
        match self {
            AppCommand::TogglePlayback => "toggle playback",
            AppCommand::StopPlayback => "stop playback",
            AppCommand::PreviousPattern => "previous pattern",
            AppCommand::NextPattern => "next pattern",
            AppCommand::CreatePattern => "create pattern",
            AppCommand::SwitchPattern(_) => "switch pattern",
            AppCommand::SetBpm(_) => "set tempo",
            AppCommand::ToggleStep { .. } => "toggle step",
            AppCommand::SetSteps { .. } => "set steps",
            AppCommand::ClearStepRange { .. } => "clear steps",
            AppCommand::ClearChannel { .. } => "clear channel",
            AppCommand::ToggleMute(_) => "toggle mute",
            AppCommand::CycleChannelMuteState(_) => "cycle mute state",
            AppCommand::SetChannelSample { .. } => "set channel sample",
            AppCommand::AddNote { .. } => "add note",
            AppCommand::RemoveNote { .. } => "remove note",
            AppCommand::UpdateNote { .. } => "update note",
            AppCommand::ToggleNote { .. } => "toggle note",
            AppCommand::TogglePlacement { .. } => "toggle placement",
            AppCommand::AddPlacements { .. } => "add placements",
            AppCommand::RemovePlacements { .. } => "remove placements",
            AppCommand::TogglePatternMute(_) => "toggle pattern mute",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_not_undoable() {
        assert!(!AppCommand::TogglePlayback.is_undoable());
        assert!(!AppCommand::StopPlayback.is_undoable());
        assert!(!AppCommand::NextPattern.is_undoable());
    }

    #[test]
    fn test_edits_are_undoable() {
        assert!(AppCommand::ToggleStep {
            pattern: 0,
            channel: 0,
            step: 0
        }
        .is_undoable());
        assert!(AppCommand::SetBpm(120.0).is_undoable());
        assert!(AppCommand::CycleChannelMuteState(0).is_undoable());
    }

    #[test]
    fn test_description() {
        assert_eq!(AppCommand::TogglePlayback.description(), "toggle playback");
        assert_eq!(
            AppCommand::TogglePlacement {
                pattern_id: 0,
                bar: 0
            }
            .description(),
            "toggle placement"
        );
    }
}
