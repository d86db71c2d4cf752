//! Shared look for the grid panels.
//!
//! Every grid (channel rack, piano roll, playlist) paints its cells the
//! same way: a resting color from the beat stripe (columns alternate in
//! groups of four), overridden by whichever highlight sits on the cell.
//! Each renderer keeps its own cell glyphs; only colors live here.

use ratatui::style::{Color, Style};

/// A highlight layered on top of a cell.
/// Precedence when several apply: cursor, then selection, then playhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Cursor,
    Selection,
    Playhead,
}

/// Resolve the winning highlight from the render flags
pub fn highlight(is_cursor: bool, is_selected: bool, is_playhead: bool) -> Option<Highlight> {
    if is_cursor {
        Some(Highlight::Cursor)
    } else if is_selected {
        Some(Highlight::Selection)
    } else if is_playhead {
        Some(Highlight::Playhead)
    } else {
        None
    }
}

/// The darker half of the beat stripe (columns 4-7, 12-15, ...)
fn off_beat(col: usize) -> bool {
    (col / 4) % 2 == 1
}

/// Resting background for a column
pub fn stripe_bg(col: usize) -> Color {
    if off_beat(col) {
        Color::Rgb(52, 38, 44)
    } else {
        Color::Rgb(38, 38, 46)
    }
}

/// Resting foreground for an occupied cell
fn stripe_fg(col: usize) -> Color {
    if off_beat(col) {
        Color::Rgb(224, 158, 176)
    } else {
        Color::Rgb(204, 204, 222)
    }
}

/// Style for one grid cell, from its column, whether something occupies it,
/// and the highlight sitting on it (if any). Occupied cells get a darkened
/// foreground under highlights so the content stays visible.
pub fn cell(col: usize, occupied: bool, highlight: Option<Highlight>) -> Style {
    let (bg, occupied_fg) = match highlight {
        None => (stripe_bg(col), stripe_fg(col)),
        Some(Highlight::Cursor) => (Color::Cyan, Color::Rgb(24, 72, 82)),
        Some(Highlight::Selection) => (Color::Yellow, Color::Red),
        Some(Highlight::Playhead) => (Color::Green, Color::Rgb(0, 56, 12)),
    };

    let style = Style::default().bg(bg);
    if occupied {
        style.fg(occupied_fg)
    } else {
        style
    }
}

/// Cursor style for the metadata columns (mute flags, names)
pub fn meta_cursor() -> Style {
    Style::default().bg(Color::Cyan).fg(Color::Black)
}

/// Dimmed foreground for muted channels and muted patterns
pub const DIMMED: Color = Color::DarkGray;
