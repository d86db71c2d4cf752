//! Playlist input: arrangement editing over the pattern x bar grid.
//!
//! Rows are the non-empty patterns; column 0 is the pattern-mute column
//! and columns 1-16 are the arrangement bars.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::command::AppCommand;
use crate::song::YankedPlacement;

use super::common::key_to_vim_char;
use super::context::PlaylistContext;
use super::registers::RegisterData;
use super::vim::{Position, Range, RangeKind, VimAction};

/// Playlist grid columns: mute column + 16 bars
const PLAYLIST_COLS: usize = 17;

/// Handle keyboard input for the playlist
pub fn handle_key(key: KeyEvent, app: &mut App) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // 'm' mutes the pattern row on the timeline
        KeyCode::Char('m') if !ctrl => {
            if let Some(pattern_id) = cursor_pattern_id(app) {
                app.dispatch(AppCommand::TogglePatternMute(pattern_id));
            }
            return;
        }
        // Space toggles playback (arrangement, from the cursor bar)
        KeyCode::Char(' ') => {
            app.dispatch(AppCommand::TogglePlayback);
            return;
        }
        // 'i' opens the cursor row's pattern in the channel rack
        KeyCode::Char('i') if !ctrl => {
            if let Some(pattern_id) = cursor_pattern_id(app) {
                app.dispatch(AppCommand::SwitchPattern(pattern_id));
                app.set_view_mode(crate::app::ViewMode::ChannelRack);
            }
            return;
        }
        _ => {}
    }

    let Some((ch, ctrl)) = key_to_vim_char(key) else {
        return;
    };

    let rows = app.pattern_row_ids().len().max(1);
    app.vim.playlist.update_dimensions(rows, PLAYLIST_COLS);

    let cursor = Position::new(app.cursors.playlist.row, app.cursors.playlist.col);
    let actions = app.vim.playlist.process_key(ch, ctrl, cursor, None);

    for action in actions {
        execute_vim_action(action, app);
    }
}

/// The pattern id of the cursor row, if any patterns are surfaced
fn cursor_pattern_id(app: &App) -> Option<usize> {
    app.pattern_row_ids()
        .get(app.cursors.playlist.row)
        .copied()
}

fn row_pattern_id(app: &App, row: usize) -> Option<usize> {
    app.pattern_row_ids().get(row).copied()
}

fn execute_vim_action(action: VimAction, app: &mut App) {
    match action {
        VimAction::MoveCursor(pos) => {
            let max_row = app.pattern_row_ids().len().saturating_sub(1);
            app.cursors.playlist.row = pos.row.min(max_row);
            app.cursors.playlist.col = pos.col.min(PLAYLIST_COLS - 1);
            scroll_cursor_into_view(app);
        }

        VimAction::Toggle => {
            let Some(pattern_id) = cursor_pattern_id(app) else {
                return;
            };
            match app.cursors.playlist.bar() {
                Some(bar) => app.dispatch(AppCommand::TogglePlacement { pattern_id, bar }),
                None => app.dispatch(AppCommand::TogglePatternMute(pattern_id)),
            }
        }

        VimAction::Yank(range) => {
            let placements = collect_placements(app, &range);
            app.registers
                .store_yank(RegisterData::Placements(placements), range.kind);
        }

        VimAction::Delete(range) => {
            let placements = collect_placements(app, &range);
            app.registers
                .store_delete(RegisterData::Placements(placements), range.kind);

            let mut cmds = Vec::new();
            let (start, end) = range.normalized();
            for row in start.row..=end.row {
                let Some(pattern_id) = row_pattern_id(app, row) else {
                    continue;
                };
                if let Some((first, last)) = row_bar_span(&range, row) {
                    cmds.push(AppCommand::RemovePlacements {
                        pattern_id,
                        start_bar: first,
                        end_bar: last,
                    });
                }
            }
            app.dispatch_batch("delete placements", cmds);
        }

        VimAction::Paste => paste_placements(app, false),
        VimAction::PasteBefore => paste_placements(app, true),

        VimAction::SelectRegister(name) => app.registers.select(name),

        VimAction::PushJump => app.push_jump(),
        VimAction::JumpBack => app.jump_back(),
        VimAction::JumpForward => app.jump_forward(),

        VimAction::SelectionChanged(_) | VimAction::ModeChanged(_) => {}
        VimAction::Escape(_) => {}

        VimAction::ScrollViewport(delta) => {
            let visible_rows = 10usize;
            let max_top = app.pattern_row_ids().len().saturating_sub(visible_rows);
            let top = &mut app.cursors.playlist.viewport_top;
            if delta > 0 {
                *top = (*top + delta as usize).min(max_top);
            } else {
                *top = top.saturating_sub((-delta) as usize);
            }
        }
    }
}

fn scroll_cursor_into_view(app: &mut App) {
    let visible_rows = 10usize;
    let row = app.cursors.playlist.row;
    let top = &mut app.cursors.playlist.viewport_top;
    if row >= *top + visible_rows {
        *top = row - visible_rows + 1;
    }
    if row < *top {
        *top = row;
    }
}

/// The bar cells a range covers in one row (grid cols 1-16 -> bars 0-15)
fn row_bar_span(range: &Range, row: usize) -> Option<(usize, usize)> {
    let mut first = None;
    let mut last = None;
    for col in 1..PLAYLIST_COLS {
        if range.contains(Position::new(row, col)) {
            let bar = col - 1;
            if first.is_none() {
                first = Some(bar);
            }
            last = Some(bar);
        }
    }
    Some((first?, last?))
}

/// Read the placements a range covers, as offsets from the range's first bar
fn collect_placements(app: &App, range: &Range) -> Vec<YankedPlacement> {
    let (start, end) = range.normalized();
    let mut yanked = Vec::new();

    for row in start.row..=end.row {
        let Some(pattern_id) = row_pattern_id(app, row) else {
            continue;
        };
        let Some((first, last)) = row_bar_span(range, row) else {
            continue;
        };
        for bar in first..=last {
            if app.has_placement(pattern_id, bar) {
                yanked.push(YankedPlacement {
                    bar_offset: bar as i32 - first as i32,
                    pattern_id,
                });
            }
        }
    }
    yanked
}

/// Paste placements at the cursor bar. Items that would land past bar 15
/// are dropped whole.
fn paste_placements(app: &mut App, before: bool) {
    let Some(content) = app.registers.paste_content() else {
        return;
    };
    let RegisterData::Placements(placements) = content.data else {
        return;
    };

    let anchor = match content.kind {
        RangeKind::Line => 0,
        _ => {
            let bar = app.cursors.playlist.bar().unwrap_or(0) as i32;
            if before {
                bar
            } else {
                bar + 1
            }
        }
    };

    let mut positions = Vec::new();
    for yanked in &placements {
        let bar = anchor + yanked.bar_offset;
        if (0..16).contains(&bar) {
            positions.push((yanked.pattern_id, bar as usize));
        }
    }
    if !positions.is_empty() {
        app.dispatch_batch(
            "paste placements",
            vec![AppCommand::AddPlacements { positions }],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ViewMode;
    use crate::input::handle_key as route_key;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn playlist_app() -> App {
        let mut app = App::new_for_test();
        // Make patterns 0 and 1 non-empty so they surface as rows
        app.dispatch(AppCommand::ToggleStep {
            pattern: 0,
            channel: 0,
            step: 0,
        });
        app.song.switch_to_pattern(1);
        app.dispatch(AppCommand::ToggleStep {
            pattern: 1,
            channel: 1,
            step: 0,
        });
        app.song.switch_to_pattern(0);
        app.view_mode = ViewMode::Playlist;
        app.mode.switch_panel(crate::app::Panel::Playlist);
        app.cursors.playlist.col = 1; // bar 0
        app
    }

    fn press(app: &mut App, c: char) {
        let key = KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        };
        route_key(key, app);
    }

    #[test]
    fn test_only_non_empty_patterns_surface() {
        let app = playlist_app();
        assert_eq!(app.pattern_row_ids(), vec![0, 1]);
    }

    #[test]
    fn test_toggle_placement_at_cursor() {
        let mut app = playlist_app();
        press(&mut app, 'x');
        assert!(app.song.arrangement.has_placement(0, 0));

        press(&mut app, 'x');
        assert!(!app.song.arrangement.has_placement(0, 0));
    }

    #[test]
    fn test_placement_undo() {
        let mut app = playlist_app();
        press(&mut app, 'x');
        press(&mut app, 'u');
        assert!(!app.song.arrangement.has_placement(0, 0));
    }

    #[test]
    fn test_mute_column_toggles_pattern_mute() {
        let mut app = playlist_app();
        app.cursors.playlist.col = 0;
        press(&mut app, 'x');
        assert!(app.song.arrangement.is_pattern_muted(0));

        press(&mut app, 'm');
        assert!(!app.song.arrangement.is_pattern_muted(0));
    }

    #[test]
    fn test_delete_placements_in_range() {
        let mut app = playlist_app();
        // Place pattern 0 at bars 0, 1, 2
        for col in [1, 2, 3] {
            app.cursors.playlist.col = col;
            press(&mut app, 'x');
        }
        app.cursors.playlist.col = 1;

        // d$ deletes to the end of the bar zone
        press(&mut app, 'd');
        press(&mut app, '$');

        assert!(app.song.arrangement.placements.is_empty());

        // One undo restores all three (batched)
        press(&mut app, 'u');
        assert_eq!(app.song.arrangement.placements.len(), 3);
    }

    #[test]
    fn test_yank_paste_placements() {
        let mut app = playlist_app();
        app.cursors.playlist.col = 1;
        press(&mut app, 'x'); // place at bar 0

        // Yank the cell, paste it after bar 4
        press(&mut app, 'v');
        press(&mut app, 'y');
        app.cursors.playlist.col = 5; // bar 4
        press(&mut app, 'p');

        assert!(app.song.arrangement.has_placement(0, 0));
        assert!(app.song.arrangement.has_placement(0, 5));
    }

    #[test]
    fn test_paste_past_timeline_end_drops_items() {
        let mut app = playlist_app();
        app.cursors.playlist.col = 1;
        press(&mut app, 'x');

        press(&mut app, 'v');
        press(&mut app, 'y');
        app.cursors.playlist.col = 16; // bar 15
        press(&mut app, 'p');

        // Bar 16 does not exist; nothing was added
        assert_eq!(app.song.arrangement.placements.len(), 1);
    }

    #[test]
    fn test_motion_rows_follow_pattern_list() {
        let mut app = playlist_app();
        press(&mut app, 'j');
        assert_eq!(app.cursors.playlist.row, 1);

        press(&mut app, 'j'); // clamped: only two rows
        assert_eq!(app.cursors.playlist.row, 1);

        press(&mut app, 'g');
        press(&mut app, 'g');
        assert_eq!(app.cursors.playlist.row, 0);
    }
}
