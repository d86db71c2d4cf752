//! Piano roll input: note placement and vim actions over the note grid.
//!
//! Note placement is a two-stage gesture: 'x' begins a pending note at the
//! cursor, a second 'x' commits it (duration = distance moved, minimum 1),
//! Escape cancels. Space auditions the pending pitch; 's' auditions the
//! cursor pitch. Rows are pitches (C6 at the top), columns are steps.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{piano_roll_row_content, App, PendingNote};
use crate::command::AppCommand;
use crate::coords::MidiPitch;
use crate::history::command::NoteChange;
use crate::song::{YankedNote, NUM_STEPS};

use super::common::key_to_vim_char;
use super::context::PianoRollContext;
use super::registers::RegisterData;
use super::vim::{Position, Range, RangeKind, VimAction};

/// Handle keyboard input for the piano roll
pub fn handle_key(key: KeyEvent, app: &mut App) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Two-stage note placement
        KeyCode::Char('x') | KeyCode::Enter if !ctrl => {
            place_or_commit_note(app);
            return;
        }
        // Space auditions the pending placement
        KeyCode::Char(' ') => {
            if let Some(pending) = app.pending_note {
                app.preview_pitch(pending.pitch);
            }
            return;
        }
        // 's' auditions the cursor pitch
        KeyCode::Char('s') if !ctrl => {
            if !app.is_previewing {
                app.preview_pitch(app.cursors.piano_roll.pitch);
            }
            return;
        }
        // Resize the note under the cursor
        KeyCode::Char('L') => {
            resize_note_at_cursor(app, 1);
            return;
        }
        KeyCode::Char('H') => {
            resize_note_at_cursor(app, -1);
            return;
        }
        KeyCode::Esc => {
            app.pending_note = None;
            // fall through so vim resets too
        }
        _ => {}
    }

    let Some((ch, ctrl)) = key_to_vim_char(key) else {
        return;
    };

    let cursor = Position::new(
        MidiPitch(app.cursors.piano_roll.pitch).to_piano_row(),
        app.cursors.piano_roll.step,
    );
    let content = piano_roll_row_content(app, app.cursors.piano_roll.pitch);

    let actions = app
        .vim
        .piano_roll
        .process_key(ch, ctrl, cursor, Some(&content));

    for action in actions {
        execute_vim_action(action, app);
    }
}

/// 'x': begin a pending note, or commit the pending one at the cursor
fn place_or_commit_note(app: &mut App) {
    let pitch = app.cursors.piano_roll.pitch;
    let step = app.cursors.piano_roll.step;

    match app.pending_note.take() {
        Some(pending) => {
            // Commit: duration spans from the placement start to the cursor
            // when the cursor stayed on the pitch row and moved right
            let duration = if pitch == pending.pitch && step >= pending.start_step {
                step - pending.start_step + 1
            } else {
                1
            };
            app.dispatch(AppCommand::ToggleNote {
                pattern: app.song.current_pattern_id,
                channel: app.cursors.channel_rack.channel,
                pitch: pending.pitch,
                start_step: pending.start_step,
                duration,
            });
        }
        None => {
            app.pending_note = Some(PendingNote {
                pitch,
                start_step: step,
            });
        }
    }
}

/// H/L: grow or shrink the note under the cursor by one step
fn resize_note_at_cursor(app: &mut App, delta: i32) {
    let pitch = app.cursors.piano_roll.pitch;
    let step = app.cursors.piano_roll.step;

    let Some(note) = app.note_at(pitch, step) else {
        return;
    };
    let note_id = note.id.clone();
    let new_duration = (note.duration as i32 + delta).max(1) as usize;
    if new_duration == note.duration {
        return;
    }

    app.dispatch(AppCommand::UpdateNote {
        pattern: app.song.current_pattern_id,
        channel: app.cursors.channel_rack.channel,
        note_id,
        change: NoteChange {
            duration: Some(new_duration),
            ..Default::default()
        },
    });
}

fn execute_vim_action(action: VimAction, app: &mut App) {
    match action {
        VimAction::MoveCursor(pos) => {
            app.cursors.piano_roll.pitch = MidiPitch::from_piano_row(pos.row).clamp_piano().0;
            app.cursors.piano_roll.step = pos.col.min(NUM_STEPS - 1);
            scroll_cursor_into_view(app);
        }

        VimAction::Toggle => {
            // 'x' is claimed before vim, so Toggle only arrives via dot
            // repeat; treat it the same way
            place_or_commit_note(app);
        }

        VimAction::Yank(range) => {
            let notes = collect_notes(app, &range);
            app.registers
                .store_yank(RegisterData::Notes(notes), range.kind);
        }

        VimAction::Delete(range) => {
            let notes = collect_notes(app, &range);
            app.registers
                .store_delete(RegisterData::Notes(notes), range.kind);

            let ids = note_ids_in_range(app, &range);
            let pattern = app.song.current_pattern_id;
            let channel = app.cursors.channel_rack.channel;
            let cmds = ids
                .into_iter()
                .map(|note_id| AppCommand::RemoveNote {
                    pattern,
                    channel,
                    note_id,
                })
                .collect();
            app.dispatch_batch("delete notes", cmds);
        }

        VimAction::Paste => paste_notes(app, false),
        VimAction::PasteBefore => paste_notes(app, true),

        VimAction::SelectRegister(name) => app.registers.select(name),

        VimAction::PushJump => app.push_jump(),
        VimAction::JumpBack => app.jump_back(),
        VimAction::JumpForward => app.jump_forward(),

        VimAction::SelectionChanged(_) | VimAction::ModeChanged(_) => {}
        VimAction::Escape(_) => {
            app.pending_note = None;
        }

        VimAction::ScrollViewport(delta) => {
            let top = &mut app.cursors.piano_roll.viewport_top;
            if delta > 0 {
                *top = top.saturating_sub(delta as u8).max(MidiPitch::PIANO_MIN.0);
            } else {
                *top = (*top + (-delta) as u8).min(MidiPitch::PIANO_MAX.0);
            }
        }
    }
}

fn scroll_cursor_into_view(app: &mut App) {
    let visible_rows = 20u8;
    let pitch = app.cursors.piano_roll.pitch;
    let top = &mut app.cursors.piano_roll.viewport_top;
    if pitch > *top {
        *top = pitch;
    }
    if pitch < top.saturating_sub(visible_rows - 1) {
        *top = (pitch + visible_rows - 1).min(MidiPitch::PIANO_MAX.0);
    }
}

/// The pitch/step rectangle a vim range covers
fn range_bounds(range: &Range) -> (u8, u8, usize, usize) {
    let (start, end) = range.normalized();
    // Row 0 is the highest pitch
    let high = MidiPitch::from_piano_row(start.row).0;
    let low = MidiPitch::from_piano_row(end.row).0;
    let (step_start, step_end) = match range.kind {
        RangeKind::Line => (0, NUM_STEPS - 1),
        _ => (start.col, end.col.min(NUM_STEPS - 1)),
    };
    (low, high, step_start, step_end)
}

/// Notes in range as anchor-relative offsets. The anchor is the range's
/// top-left corner (highest pitch, first step).
fn collect_notes(app: &App, range: &Range) -> Vec<YankedNote> {
    let (low, high, step_start, step_end) = range_bounds(range);
    app.notes_in_range(low..=high, step_start..step_end + 1)
        .into_iter()
        .map(|note| YankedNote {
            pitch_offset: note.pitch as i32 - high as i32,
            step_offset: note.start_step as i32 - step_start as i32,
            duration: note.duration,
        })
        .collect()
}

fn note_ids_in_range(app: &App, range: &Range) -> Vec<String> {
    let (low, high, step_start, step_end) = range_bounds(range);
    app.notes_in_range(low..=high, step_start..step_end + 1)
        .into_iter()
        .map(|note| note.id.clone())
        .collect()
}

/// Paste yanked notes at the cursor. Items whose pitch leaves [0,127] or
/// whose span would cross the pattern end are dropped whole, never clipped
/// mid-note.
fn paste_notes(app: &mut App, before: bool) {
    let Some(content) = app.registers.paste_content() else {
        return;
    };
    let RegisterData::Notes(notes) = content.data else {
        return;
    };

    let anchor_pitch = app.cursors.piano_roll.pitch as i32;
    let anchor_step = match content.kind {
        RangeKind::Line => 0,
        _ => {
            let step = app.cursors.piano_roll.step as i32;
            if before {
                step
            } else {
                step + 1
            }
        }
    };

    let pattern = app.song.current_pattern_id;
    let channel = app.cursors.channel_rack.channel;
    let mut cmds = Vec::new();
    for yanked in &notes {
        let pitch = anchor_pitch + yanked.pitch_offset;
        let start = anchor_step + yanked.step_offset;
        if !(0..=127).contains(&pitch) {
            continue;
        }
        if start < 0 || start as usize + yanked.duration > NUM_STEPS {
            continue;
        }
        cmds.push(AppCommand::AddNote {
            pattern,
            channel,
            pitch: pitch as u8,
            start_step: start as usize,
            duration: yanked.duration,
        });
    }
    app.dispatch_batch("paste notes", cmds);
}
