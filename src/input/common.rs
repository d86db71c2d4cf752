//! Shared key-event helpers for the input handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Convert a crossterm key event into the (char, ctrl) pair the vim state
/// machine consumes. Escape maps to 0x1b, Enter to '\r'. Arrow keys map to
/// their h/j/k/l equivalents. Returns None for keys vim has no use for.
pub fn key_to_vim_char(key: KeyEvent) -> Option<(char, bool)> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Some(('\x1b', false)),
        KeyCode::Enter => Some(('\r', false)),
        KeyCode::Left => Some(('h', false)),
        KeyCode::Down => Some(('j', false)),
        KeyCode::Up => Some(('k', false)),
        KeyCode::Right => Some(('l', false)),
        KeyCode::Char(c) => Some((c, ctrl)),
        _ => None,
    }
}
