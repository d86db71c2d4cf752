//! Browser input: tree navigation with vim motions.
//!
//! h/l are custom motions here (collapse / expand a tree node) and win
//! over the default column motions. In selection mode, Enter assigns the
//! selected sample to the requesting channel.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::command::AppCommand;

use super::common::key_to_vim_char;
use super::vim::{Position, VimAction};

/// Handle keyboard input for the sample browser
pub fn handle_key(key: KeyEvent, app: &mut App) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Custom motions: collapse / expand win over column defaults
        KeyCode::Char('h') | KeyCode::Left if !ctrl => {
            app.browser.collapse_or_parent();
            return;
        }
        KeyCode::Char('l') | KeyCode::Right if !ctrl => {
            app.browser.expand();
            return;
        }
        // Space previews the selected file (exclusive)
        KeyCode::Char(' ') => {
            if let Some(path) = app.browser.selected_file_path() {
                app.audio.preview_sample(&path);
                app.is_previewing = true;
            }
            return;
        }
        // Enter/x: assign in selection mode, otherwise toggle or preview
        KeyCode::Enter | KeyCode::Char('x') if !ctrl => {
            if let Some(channel) = app.mode.browser_selection_channel() {
                if let Some(path) = app.browser.selected_relative_path() {
                    // Warm the cache so the first trigger doesn't decode
                    if let Some(full) = app.browser.selected_file_path() {
                        app.audio.preload_sample(&full);
                    }
                    app.dispatch(AppCommand::SetChannelSample { channel, path });
                    app.mode.close_modal();
                }
                // Folders just expand/collapse while selecting
                if app.browser.current_entry().map(|e| e.is_dir).unwrap_or(false) {
                    app.browser.toggle_or_select();
                }
            } else if let Some(path) = app.browser.toggle_or_select() {
                app.audio.preview_sample(&path);
                app.is_previewing = true;
            }
            return;
        }
        KeyCode::Esc => {
            if app.mode.is_browser_selection() {
                app.mode.close_modal();
                return;
            }
            // fall through to vim for mode reset
        }
        _ => {}
    }

    let Some((ch, ctrl)) = key_to_vim_char(key) else {
        return;
    };

    let rows = app.browser.visible_entries.len().max(1);
    app.vim.browser.update_dimensions(rows, 1);

    let cursor = Position::new(app.browser.cursor, 0);
    let actions = app.vim.browser.process_key(ch, ctrl, cursor, None);

    for action in actions {
        match action {
            VimAction::MoveCursor(pos) => app.browser.go_to_row(pos.row),
            // Jump motions in the browser stay within the tree
            VimAction::PushJump | VimAction::JumpBack | VimAction::JumpForward => {}
            _ => {}
        }
    }
}
