//! Channel rack input: vim actions over the step grid.
//!
//! Keys go to the vim machine; the actions it returns are executed here by
//! translating ranges into journal commands and register traffic.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{channel_rack_row_content, App, ViewMode};
use crate::command::AppCommand;
use crate::coords::{AppCol, VimCol};
use crate::song::{ChannelKind, NUM_STEPS};

use super::common::key_to_vim_char;
use super::registers::RegisterData;
use super::vim::{Position, Range, RangeKind, VimAction};

/// Handle keyboard input for the channel rack
pub fn handle_key(key: KeyEvent, app: &mut App) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Keys the grid claims before vim sees them
    match key.code {
        // 'm' cycles mute state: clean -> muted -> solo -> clean
        KeyCode::Char('m') if !ctrl => {
            let channel = app.cursors.channel_rack.channel;
            if channel < app.song.channels.len() {
                app.dispatch(AppCommand::CycleChannelMuteState(channel));
            }
            return;
        }
        // 'M' flips the mute flag without entering the cycle
        KeyCode::Char('M') => {
            let channel = app.cursors.channel_rack.channel;
            if channel < app.song.channels.len() {
                app.dispatch(AppCommand::ToggleMute(channel));
            }
            return;
        }
        // Hold 's' to preview the channel (release handled at the router)
        KeyCode::Char('s') if !ctrl => {
            if !app.is_previewing {
                app.start_channel_preview(app.cursors.channel_rack.channel);
            }
            return;
        }
        // 'i' opens the piano roll for the current channel
        KeyCode::Char('i') if !ctrl => {
            app.set_view_mode(ViewMode::PianoRoll);
            return;
        }
        // 'r' in the name zone renames the channel
        KeyCode::Char('r') if !ctrl && app.cursors.channel_rack.col.is_name_zone() => {
            let channel = app.cursors.channel_rack.channel;
            app.start_text_input(crate::app::InputTarget::ChannelRename { channel });
            return;
        }
        // Pattern switching
        KeyCode::Char('[') => {
            app.dispatch(AppCommand::PreviousPattern);
            return;
        }
        KeyCode::Char(']') => {
            app.dispatch(AppCommand::NextPattern);
            return;
        }
        // 'n' creates a fresh pattern and switches to it
        KeyCode::Char('n') if !ctrl => {
            app.dispatch(AppCommand::CreatePattern);
            return;
        }
        // Space toggles playback
        KeyCode::Char(' ') => {
            app.dispatch(AppCommand::TogglePlayback);
            return;
        }
        _ => {}
    }

    let Some((ch, ctrl)) = key_to_vim_char(key) else {
        return;
    };

    let vim_col: VimCol = app.cursors.channel_rack.col.into();
    let cursor = Position::new(app.cursors.channel_rack.channel, vim_col.0);
    let content = channel_rack_row_content(app, cursor.row);

    app.vim
        .channel_rack
        .update_dimensions(app.song.channels.len().max(1), VimCol::COUNT);
    let actions = app
        .vim
        .channel_rack
        .process_key(ch, ctrl, cursor, Some(&content));

    for action in actions {
        execute_vim_action(action, app);
    }
}

fn execute_vim_action(action: VimAction, app: &mut App) {
    match action {
        VimAction::MoveCursor(pos) => {
            let max_channel = app.song.channels.len().saturating_sub(1);
            app.cursors.channel_rack.channel = pos.row.min(max_channel);
            app.cursors.channel_rack.col = AppCol::from(VimCol(pos.col)).clamp();
            scroll_cursor_into_view(app);
        }

        VimAction::Toggle => {
            let channel = app.cursors.channel_rack.channel;
            let col = app.cursors.channel_rack.col;
            if col.is_step_zone() {
                // Synth channels sequence from the piano roll, not the grid
                if let Some(ch) = app.song.channels.get(channel) {
                    if ch.kind == ChannelKind::Synth {
                        app.set_view_mode(ViewMode::PianoRoll);
                        return;
                    }
                }
                app.dispatch(AppCommand::ToggleStep {
                    pattern: app.song.current_pattern_id,
                    channel,
                    step: col.to_step_or_zero(),
                });
            } else if col.is_mute_zone() {
                app.dispatch(AppCommand::CycleChannelMuteState(channel));
            } else if col.is_name_zone() {
                // Pick a sample from the browser for this channel
                app.push_jump();
                app.mode.enter_browser_selection(channel);
                app.show_browser = true;
            }
        }

        VimAction::Yank(range) => {
            let data = collect_steps(app, &range);
            app.registers
                .store_yank(RegisterData::Steps(data), range.kind);
        }

        VimAction::Delete(range) => {
            let data = collect_steps(app, &range);
            app.registers
                .store_delete(RegisterData::Steps(data), range.kind);

            let pattern = app.song.current_pattern_id;
            let mut cmds = Vec::new();
            let (start, end) = range.normalized();
            for row in start.row..=end.row.min(app.song.channels.len().saturating_sub(1)) {
                if range.kind == RangeKind::Line {
                    cmds.push(AppCommand::ClearChannel {
                        pattern,
                        channel: row,
                    });
                } else if let Some((first, last)) = row_step_span(&range, row) {
                    cmds.push(AppCommand::ClearStepRange {
                        pattern,
                        channel: row,
                        start: first,
                        end: last,
                    });
                }
            }
            app.dispatch_batch("delete steps", cmds);
        }

        VimAction::Paste => paste_steps(app, false),
        VimAction::PasteBefore => paste_steps(app, true),

        VimAction::SelectRegister(name) => app.registers.select(name),

        VimAction::PushJump => app.push_jump(),
        VimAction::JumpBack => app.jump_back(),
        VimAction::JumpForward => app.jump_forward(),

        VimAction::SelectionChanged(_) | VimAction::ModeChanged(_) => {
            // UI queries vim state during render
        }
        VimAction::Escape(_) => {}

        VimAction::ScrollViewport(delta) => {
            let visible_rows = 15usize;
            let max_top = app.song.channels.len().saturating_sub(visible_rows);
            let top = &mut app.cursors.channel_rack.viewport_top;
            if delta > 0 {
                *top = (*top + delta as usize).min(max_top);
            } else {
                *top = top.saturating_sub((-delta) as usize);
            }
        }
    }
}

fn scroll_cursor_into_view(app: &mut App) {
    let visible_rows = 15usize;
    let cursor = app.cursors.channel_rack.channel;
    let top = &mut app.cursors.channel_rack.viewport_top;
    if cursor >= *top + visible_rows {
        *top = cursor - visible_rows + 1;
    }
    if cursor < *top {
        *top = cursor;
    }
}

/// The step cells a range covers in one row, as steps (not vim columns)
fn row_step_span(range: &Range, row: usize) -> Option<(usize, usize)> {
    let mut first = None;
    let mut last = None;
    for col in 0..VimCol::COUNT {
        if range.contains(Position::new(row, col)) {
            if let Some(step) = VimCol(col).to_step() {
                if first.is_none() {
                    first = Some(step);
                }
                last = Some(step);
            }
        }
    }
    Some((first?, last?))
}

/// Read the step data a range covers, row-major
fn collect_steps(app: &App, range: &Range) -> Vec<Vec<bool>> {
    let Some(pattern) = app.song.current_pattern() else {
        return Vec::new();
    };
    let (start, end) = range.normalized();
    let max_row = app.song.channels.len().saturating_sub(1);

    let mut rows = Vec::new();
    for row in start.row..=end.row.min(max_row) {
        if let Some((first, last)) = row_step_span(range, row) {
            rows.push((first..=last).map(|s| pattern.get_step(row, s)).collect());
        }
    }
    rows
}

/// Paste step data at the cursor: `p` inserts one column right, `P` at the
/// cursor. Linewise content pastes whole rows starting at the cursor row.
fn paste_steps(app: &mut App, before: bool) {
    let Some(content) = app.registers.paste_content() else {
        return;
    };
    // A register holding another grid's payload is a silent no-op here
    let RegisterData::Steps(rows) = content.data else {
        return;
    };

    let cursor = app.cursors.channel_rack;
    let start_step = match content.kind {
        RangeKind::Line => 0,
        _ => {
            let step = cursor.col.to_step_or_zero();
            if before {
                step
            } else {
                step + 1
            }
        }
    };

    let pattern = app.song.current_pattern_id;
    let mut cmds = Vec::new();
    for (offset, values) in rows.iter().enumerate() {
        let channel = cursor.channel + offset;
        if channel >= app.song.channels.len() || start_step >= NUM_STEPS {
            break;
        }
        cmds.push(AppCommand::SetSteps {
            pattern,
            channel,
            start: start_step,
            values: values.clone(),
        });
    }
    app.dispatch_batch("paste steps", cmds);
}
