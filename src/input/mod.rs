//! Input handling: the key router and the per-panel vim glue.

pub mod browser;
pub mod channel_rack;
pub mod common;
pub mod context;
pub mod piano_roll;
pub mod playlist;
pub mod registers;
pub mod vim;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tui_input::backend::crossterm::EventHandler;

use crate::app::{App, InputTarget, Panel, ViewMode};

/// Handle a keyboard event. Returns true if the app should quit.
pub fn handle_key(key: KeyEvent, app: &mut App) -> bool {
    // Key releases only matter for hold-to-preview
    if key.kind == KeyEventKind::Release {
        if matches!(key.code, KeyCode::Char('s') | KeyCode::Char(' ')) && app.is_previewing {
            app.stop_preview();
        }
        return false;
    }

    // Ignore key repeats entirely
    if key.kind == KeyEventKind::Repeat {
        return false;
    }

    // Text input mode (tempo entry, channel rename)
    if app.mode.is_text_input() {
        return handle_text_input_key(key, app);
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keybindings
    match key.code {
        KeyCode::Tab => {
            app.next_panel();
            return false;
        }
        KeyCode::F(1) => {
            app.set_view_mode(ViewMode::ChannelRack);
            return false;
        }
        KeyCode::F(2) => {
            app.set_view_mode(ViewMode::PianoRoll);
            return false;
        }
        KeyCode::F(3) => {
            app.set_view_mode(ViewMode::Playlist);
            return false;
        }
        KeyCode::Char('b') if ctrl => {
            app.toggle_browser();
            return false;
        }
        KeyCode::Char('t') if ctrl => {
            app.start_text_input(InputTarget::Tempo);
            return false;
        }
        KeyCode::Char('q') if ctrl => {
            app.should_quit = true;
            return true;
        }
        // Stop transport without resetting the playhead
        KeyCode::Char('.') if ctrl => {
            app.dispatch(crate::command::AppCommand::StopPlayback);
            return false;
        }
        // Undo / redo
        KeyCode::Char('u') if !ctrl => {
            app.undo();
            return false;
        }
        KeyCode::Char('r') if ctrl => {
            app.redo();
            return false;
        }
        _ => {}
    }

    // Panel-specific handling
    match app.mode.current_panel() {
        Panel::ChannelRack => channel_rack::handle_key(key, app),
        Panel::PianoRoll => piano_roll::handle_key(key, app),
        Panel::Playlist => playlist::handle_key(key, app),
        Panel::Browser => browser::handle_key(key, app),
    }

    false
}

/// Text input mode: Escape cancels, Enter commits, tempo input only
/// accepts digits and a decimal point.
fn handle_text_input_key(key: KeyEvent, app: &mut App) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.mode.close_modal();
        }
        KeyCode::Enter => {
            app.commit_text_input();
        }
        KeyCode::Char(c) if tempo_input_active(app) && !(c.is_ascii_digit() || c == '.') => {
            // Non-numeric characters are ignored for tempo
        }
        _ => {
            app.text_input.handle_event(&Event::Key(key));
        }
    }
    false
}

fn tempo_input_active(app: &App) -> bool {
    matches!(
        app.mode,
        crate::mode::AppMode::TextInput {
            target: InputTarget::Tempo,
            ..
        }
    )
}
