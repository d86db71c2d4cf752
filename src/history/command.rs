//! Reversible edit commands for the journal.
//!
//! Commands are a tagged enum rather than trait objects: the variant carries
//! its own lazily-captured inverse payload, and batching is just a variant
//! wrapping a list. Each command captures the data needed to undo on its
//! *first* execute only, so a redo reproduces the exact original mutation
//! (note ids in particular are minted once and never re-minted).

use std::path::Path;

use crate::input::vim::Position;
use crate::mode::ViewMode;
use crate::song::{Note, PatternPlacement, Song, NUM_STEPS};

/// Cursor snapshot stored with a command so undo/redo can put the cursor
/// back where the edit happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSnapshot {
    pub view: ViewMode,
    pub position: Position,
}

/// Inverse payload for CycleMuteState
#[derive(Debug, Clone, Copy)]
pub struct MuteCycleInverse {
    pub muted: bool,
    pub solo: bool,
    /// Channel whose solo this cycle stole, with its prior muted flag
    pub cleared_solo: Option<(usize, bool)>,
}

/// Partial note update; only the set fields are merged
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoteChange {
    pub pitch: Option<u8>,
    pub start_step: Option<usize>,
    pub duration: Option<usize>,
}

/// Which side of a toggle fired
#[derive(Debug, Clone)]
pub enum ToggleNoteFired {
    Added(Note),
    Removed(Note),
}

/// Which side of a placement toggle fired
#[derive(Debug, Clone)]
pub enum TogglePlacementFired {
    Added(PatternPlacement),
    Removed(PatternPlacement),
}

/// All reversible edits, with their lazily-captured inverse payloads
#[derive(Debug, Clone)]
pub enum EditOp {
    ToggleStep {
        pattern_id: usize,
        channel: usize,
        step: usize,
        was_on: Option<bool>,
    },
    SetSteps {
        pattern_id: usize,
        channel: usize,
        start: usize,
        values: Vec<bool>,
        prior: Option<Vec<bool>>,
    },
    ClearStepRange {
        pattern_id: usize,
        channel: usize,
        start: usize,
        end: usize,
        prior: Option<Vec<bool>>,
    },
    ClearChannel {
        pattern_id: usize,
        channel: usize,
        prior: Option<Vec<bool>>,
    },
    ToggleMute {
        channel: usize,
        was_muted: Option<bool>,
    },
    CycleMuteState {
        channel: usize,
        prior: Option<MuteCycleInverse>,
    },
    SetChannelSample {
        channel: usize,
        path: String,
        /// Prior (sample_ref, name)
        prior: Option<(String, String)>,
    },
    AddNote {
        pattern_id: usize,
        channel: usize,
        pitch: u8,
        start_step: usize,
        duration: usize,
        /// The note as minted on first execute
        note: Option<Note>,
    },
    RemoveNote {
        pattern_id: usize,
        channel: usize,
        note_id: String,
        removed: Option<Note>,
    },
    UpdateNote {
        pattern_id: usize,
        channel: usize,
        note_id: String,
        change: NoteChange,
        /// Prior values of exactly the updated fields
        prior: Option<NoteChange>,
    },
    ToggleNote {
        pattern_id: usize,
        channel: usize,
        pitch: u8,
        start_step: usize,
        duration: usize,
        fired: Option<ToggleNoteFired>,
    },
    TogglePlacement {
        pattern_id: usize,
        bar: usize,
        fired: Option<TogglePlacementFired>,
    },
    AddPlacements {
        /// (pattern_id, bar) pairs to place
        positions: Vec<(usize, usize)>,
        added: Option<Vec<PatternPlacement>>,
    },
    RemovePlacements {
        pattern_id: usize,
        start_bar: usize,
        end_bar: usize,
        removed: Option<Vec<PatternPlacement>>,
    },
    TogglePatternMute {
        pattern_id: usize,
    },
    SetBpm {
        bpm: f64,
        prior: Option<f64>,
    },
    Batch {
        commands: Vec<Command>,
        description: String,
    },
}

/// A journaled command: an edit plus an optional cursor snapshot
#[derive(Debug, Clone)]
pub struct Command {
    pub op: EditOp,
    pub cursor: Option<CursorSnapshot>,
}

impl Command {
    pub fn new(op: EditOp) -> Self {
        Self { op, cursor: None }
    }

    pub fn with_cursor(op: EditOp, cursor: CursorSnapshot) -> Self {
        Self {
            op,
            cursor: Some(cursor),
        }
    }

    /// Execute the edit against the model. Inverse payloads are captured
    /// the first time through; re-execution (redo) reuses them.
    pub fn execute(&mut self, song: &mut Song) {
        match &mut self.op {
            EditOp::ToggleStep {
                pattern_id,
                channel,
                step,
                was_on,
            } => {
                let pattern = song.pattern_or_create(*pattern_id);
                if was_on.is_none() {
                    *was_on = Some(pattern.get_step(*channel, *step));
                }
                pattern.set_step(*channel, *step, !was_on.unwrap());
            }

            EditOp::SetSteps {
                pattern_id,
                channel,
                start,
                values,
                prior,
            } => {
                let pattern = song.pattern_or_create(*pattern_id);
                let end = (*start + values.len()).min(NUM_STEPS);
                if prior.is_none() {
                    *prior = Some((*start..end).map(|s| pattern.get_step(*channel, s)).collect());
                }
                for (offset, &value) in values.iter().enumerate() {
                    let step = *start + offset;
                    if step < NUM_STEPS {
                        pattern.set_step(*channel, step, value);
                    }
                }
            }

            EditOp::ClearStepRange {
                pattern_id,
                channel,
                start,
                end,
                prior,
            } => {
                let pattern = song.pattern_or_create(*pattern_id);
                let end = (*end).min(NUM_STEPS - 1);
                if prior.is_none() {
                    *prior = Some((*start..=end).map(|s| pattern.get_step(*channel, s)).collect());
                }
                for step in *start..=end {
                    pattern.set_step(*channel, step, false);
                }
            }

            EditOp::ClearChannel {
                pattern_id,
                channel,
                prior,
            } => {
                let pattern = song.pattern_or_create(*pattern_id);
                if prior.is_none() {
                    *prior = pattern.steps.get(*channel).cloned();
                }
                if let Some(row) = pattern.steps.get_mut(*channel) {
                    row.iter_mut().for_each(|s| *s = false);
                }
            }

            EditOp::ToggleMute { channel, was_muted } => {
                if let Some(ch) = song.channels.get_mut(*channel) {
                    if was_muted.is_none() {
                        *was_muted = Some(ch.muted);
                    }
                    ch.muted = !was_muted.unwrap();
                }
            }

            EditOp::CycleMuteState { channel, prior } => {
                let Some(ch) = song.channels.get(*channel) else {
                    return;
                };
                let (muted, solo) = (ch.muted, ch.solo);
                if prior.is_none() {
                    // Only the muted -> solo transition steals solo from
                    // another channel
                    let cleared_solo = if muted && !solo {
                        song.solo_channel()
                            .filter(|&c| c != *channel)
                            .map(|c| (c, song.channels[c].muted))
                    } else {
                        None
                    };
                    *prior = Some(MuteCycleInverse {
                        muted,
                        solo,
                        cleared_solo,
                    });
                }
                // clean -> muted -> solo -> clean. Taking solo demotes the
                // previous holder to muted.
                if solo {
                    let ch = &mut song.channels[*channel];
                    ch.solo = false;
                    ch.muted = false;
                } else if muted {
                    if let Some(holder) = song.solo_channel().filter(|&c| c != *channel) {
                        song.channels[holder].solo = false;
                        song.channels[holder].muted = true;
                    }
                    let ch = &mut song.channels[*channel];
                    ch.muted = false;
                    ch.solo = true;
                } else {
                    song.channels[*channel].muted = true;
                }
            }

            EditOp::SetChannelSample {
                channel,
                path,
                prior,
            } => {
                if let Some(ch) = song.channels.get_mut(*channel) {
                    if prior.is_none() {
                        *prior = Some((ch.sample_ref.clone(), ch.name.clone()));
                    }
                    ch.sample_ref = path.clone();
                    ch.name = Path::new(path)
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("Sample")
                        .to_string();
                }
            }

            EditOp::AddNote {
                pattern_id,
                channel,
                pitch,
                start_step,
                duration,
                note,
            } => {
                if note.is_none() {
                    *note = Some(Note::new(*pitch, *start_step, *duration));
                }
                let pattern = song.pattern_or_create(*pattern_id);
                pattern.add_note(*channel, note.clone().unwrap());
            }

            EditOp::RemoveNote {
                pattern_id,
                channel,
                note_id,
                removed,
            } => {
                if let Some(pattern) = song.pattern_mut(*pattern_id) {
                    if let Some(note) = pattern.remove_note(*channel, note_id) {
                        if removed.is_none() {
                            *removed = Some(note);
                        }
                    }
                }
            }

            EditOp::UpdateNote {
                pattern_id,
                channel,
                note_id,
                change,
                prior,
            } => {
                let Some(pattern) = song.pattern_mut(*pattern_id) else {
                    return;
                };
                let Some(notes) = pattern.notes.get_mut(*channel) else {
                    return;
                };
                let Some(note) = notes.iter_mut().find(|n| n.id == *note_id) else {
                    return;
                };
                if prior.is_none() {
                    *prior = Some(NoteChange {
                        pitch: change.pitch.map(|_| note.pitch),
                        start_step: change.start_step.map(|_| note.start_step),
                        duration: change.duration.map(|_| note.duration),
                    });
                }
                apply_note_change(note, change);
            }

            EditOp::ToggleNote {
                pattern_id,
                channel,
                pitch,
                start_step,
                duration,
                fired,
            } => {
                if fired.is_none() {
                    let pattern = song.pattern_or_create(*pattern_id);
                    *fired = match pattern.note_starting_at(*channel, *pitch, *start_step) {
                        Some(existing) => Some(ToggleNoteFired::Removed(existing.clone())),
                        None => Some(ToggleNoteFired::Added(Note::new(
                            *pitch,
                            *start_step,
                            *duration,
                        ))),
                    };
                }
                let pattern = song.pattern_or_create(*pattern_id);
                match fired.as_ref().unwrap() {
                    ToggleNoteFired::Added(note) => pattern.add_note(*channel, note.clone()),
                    ToggleNoteFired::Removed(note) => {
                        pattern.remove_note(*channel, &note.id);
                    }
                }
            }

            EditOp::TogglePlacement {
                pattern_id,
                bar,
                fired,
            } => {
                if fired.is_none() {
                    *fired = match song.arrangement.placement_at(*pattern_id, *bar) {
                        Some(existing) => Some(TogglePlacementFired::Removed(existing.clone())),
                        None => Some(TogglePlacementFired::Added(PatternPlacement::new(
                            *pattern_id,
                            *bar,
                        ))),
                    };
                }
                match fired.as_ref().unwrap() {
                    TogglePlacementFired::Added(placement) => {
                        song.arrangement.add_placement(placement.clone());
                    }
                    TogglePlacementFired::Removed(placement) => {
                        song.arrangement.remove_placement(&placement.id);
                    }
                }
            }

            EditOp::AddPlacements { positions, added } => {
                if added.is_none() {
                    *added = Some(
                        positions
                            .iter()
                            .filter(|(pattern_id, bar)| {
                                !song.arrangement.has_placement(*pattern_id, *bar)
                            })
                            .map(|&(pattern_id, bar)| PatternPlacement::new(pattern_id, bar))
                            .collect(),
                    );
                }
                for placement in added.as_ref().unwrap() {
                    song.arrangement.add_placement(placement.clone());
                }
            }

            EditOp::RemovePlacements {
                pattern_id,
                start_bar,
                end_bar,
                removed,
            } => {
                let result =
                    song.arrangement
                        .remove_placements_in_range(*pattern_id, *start_bar, *end_bar);
                if removed.is_none() {
                    *removed = Some(result);
                }
            }

            EditOp::TogglePatternMute { pattern_id } => {
                song.arrangement.toggle_pattern_mute(*pattern_id);
            }

            EditOp::SetBpm { bpm, prior } => {
                if prior.is_none() {
                    *prior = Some(song.bpm);
                }
                song.bpm = bpm.clamp(20.0, 999.0);
            }

            EditOp::Batch { commands, .. } => {
                for cmd in commands.iter_mut() {
                    cmd.execute(song);
                }
            }
        }
    }

    /// Reverse the edit using the captured inverse payload
    pub fn undo(&mut self, song: &mut Song) {
        match &mut self.op {
            EditOp::ToggleStep {
                pattern_id,
                channel,
                step,
                was_on,
            } => {
                if let (Some(pattern), Some(was_on)) = (song.pattern_mut(*pattern_id), *was_on) {
                    pattern.set_step(*channel, *step, was_on);
                }
            }

            EditOp::SetSteps {
                pattern_id,
                channel,
                start,
                prior,
                ..
            }
            | EditOp::ClearStepRange {
                pattern_id,
                channel,
                start,
                prior,
                ..
            } => {
                if let (Some(pattern), Some(prior)) = (song.pattern_mut(*pattern_id), prior) {
                    for (offset, &value) in prior.iter().enumerate() {
                        pattern.set_step(*channel, *start + offset, value);
                    }
                }
            }

            EditOp::ClearChannel {
                pattern_id,
                channel,
                prior,
            } => {
                if let (Some(pattern), Some(prior)) = (song.pattern_mut(*pattern_id), prior) {
                    if let Some(row) = pattern.steps.get_mut(*channel) {
                        row.copy_from_slice(prior);
                    }
                }
            }

            EditOp::ToggleMute { channel, was_muted } => {
                if let (Some(ch), Some(was_muted)) = (song.channels.get_mut(*channel), *was_muted) {
                    ch.muted = was_muted;
                }
            }

            EditOp::CycleMuteState { channel, prior } => {
                let Some(inverse) = *prior else { return };
                if let Some(ch) = song.channels.get_mut(*channel) {
                    ch.muted = inverse.muted;
                    ch.solo = inverse.solo;
                }
                if let Some((other, was_muted)) = inverse.cleared_solo {
                    if let Some(ch) = song.channels.get_mut(other) {
                        ch.solo = true;
                        ch.muted = was_muted;
                    }
                }
            }

            EditOp::SetChannelSample { channel, prior, .. } => {
                if let (Some(ch), Some((sample_ref, name))) =
                    (song.channels.get_mut(*channel), prior.as_ref())
                {
                    ch.sample_ref = sample_ref.clone();
                    ch.name = name.clone();
                }
            }

            EditOp::AddNote {
                pattern_id,
                channel,
                note,
                ..
            } => {
                if let (Some(pattern), Some(note)) = (song.pattern_mut(*pattern_id), note.as_ref())
                {
                    pattern.remove_note(*channel, &note.id);
                }
            }

            EditOp::RemoveNote {
                pattern_id,
                channel,
                removed,
                ..
            } => {
                if let Some(note) = removed.clone() {
                    song.pattern_or_create(*pattern_id).add_note(*channel, note);
                }
            }

            EditOp::UpdateNote {
                pattern_id,
                channel,
                note_id,
                prior,
                ..
            } => {
                let Some(prior) = *prior else { return };
                if let Some(notes) = song
                    .pattern_mut(*pattern_id)
                    .and_then(|p| p.notes.get_mut(*channel))
                {
                    if let Some(note) = notes.iter_mut().find(|n| n.id == *note_id) {
                        apply_note_change(note, &prior);
                    }
                }
            }

            EditOp::ToggleNote {
                pattern_id,
                channel,
                fired,
                ..
            } => {
                let pattern = song.pattern_or_create(*pattern_id);
                match fired.as_ref() {
                    Some(ToggleNoteFired::Added(note)) => {
                        pattern.remove_note(*channel, &note.id);
                    }
                    Some(ToggleNoteFired::Removed(note)) => {
                        pattern.add_note(*channel, note.clone());
                    }
                    None => {}
                }
            }

            EditOp::TogglePlacement { fired, .. } => match fired.as_ref() {
                Some(TogglePlacementFired::Added(placement)) => {
                    song.arrangement.remove_placement(&placement.id);
                }
                Some(TogglePlacementFired::Removed(placement)) => {
                    song.arrangement.add_placement(placement.clone());
                }
                None => {}
            },

            EditOp::AddPlacements { added, .. } => {
                if let Some(added) = added.as_ref() {
                    for placement in added {
                        song.arrangement.remove_placement(&placement.id);
                    }
                }
            }

            EditOp::RemovePlacements { removed, .. } => {
                if let Some(removed) = removed.as_ref() {
                    for placement in removed {
                        song.arrangement.add_placement(placement.clone());
                    }
                }
            }

            EditOp::TogglePatternMute { pattern_id } => {
                song.arrangement.toggle_pattern_mute(*pattern_id);
            }

            EditOp::SetBpm { prior, .. } => {
                if let Some(prior) = *prior {
                    song.bpm = prior;
                }
            }

            EditOp::Batch { commands, .. } => {
                for cmd in commands.iter_mut().rev() {
                    cmd.undo(song);
                }
            }
        }
    }

    /// Human-readable description for the status bar and event log
    pub fn description(&self) -> &str {
        match &self.op {
            EditOp::ToggleStep { .. } => "toggle step",
            EditOp::SetSteps { .. } => "set steps",
            EditOp::ClearStepRange { .. } => "clear steps",
            EditOp::ClearChannel { .. } => "clear channel",
            EditOp::ToggleMute { .. } => "toggle mute",
            EditOp::CycleMuteState { .. } => "cycle mute state",
            EditOp::SetChannelSample { .. } => "set channel sample",
            EditOp::AddNote { .. } => "add note",
            EditOp::RemoveNote { .. } => "remove note",
            EditOp::UpdateNote { .. } => "update note",
            EditOp::ToggleNote { .. } => "toggle note",
            EditOp::TogglePlacement { .. } => "toggle placement",
            EditOp::AddPlacements { .. } => "add placements",
            EditOp::RemovePlacements { .. } => "remove placements",
            EditOp::TogglePatternMute { .. } => "toggle pattern mute",
            EditOp::SetBpm { .. } => "set tempo",
            EditOp::Batch { description, .. } => description,
        }
    }
}

fn apply_note_change(note: &mut Note, change: &NoteChange) {
    if let Some(pitch) = change.pitch {
        note.pitch = pitch.min(127);
    }
    if let Some(start_step) = change.start_step {
        note.start_step = start_step.min(NUM_STEPS - 1);
    }
    if let Some(duration) = change.duration {
        note.duration = duration.clamp(1, NUM_STEPS - note.start_step);
    }
}
