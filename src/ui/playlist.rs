//! Playlist grid: non-empty patterns as rows, 16 arrangement bars as
//! columns, with a pattern-mute column on the left.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Panel};
use crate::input::context::PlaylistContext;
use crate::input::vim::Position;
use crate::playback::TransportMode;
use crate::song::NUM_BARS;

use super::render_panel_frame;
use super::theme;

/// Bar cell glyphs (three columns wide)
const BAR_ON: &str = "███";
const BAR_OFF: &str = "   ";

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let inner = render_panel_frame(frame, area, "Playlist", Panel::Playlist, app);

    let cursor = &app.cursors.playlist;
    let cursor_vim = Position::new(cursor.row, cursor.col);
    let selection = app.vim.playlist.get_selection(cursor_vim);
    let focused = app.mode.current_panel() == Panel::Playlist;

    let playhead_bar = (app.transport.playing
        && app.transport.mode == TransportMode::Arrangement)
        .then(|| app.transport.arrangement_bar());

    let row_ids = app.pattern_row_ids();
    let visible_rows = inner.height as usize;

    let mut lines = Vec::new();
    for (row, &pattern_id) in row_ids
        .iter()
        .enumerate()
        .skip(cursor.viewport_top)
        .take(visible_rows)
    {
        let mut spans = Vec::new();
        let is_cursor_row = focused && row == cursor.row;
        let pattern_muted = app.song.arrangement.is_pattern_muted(pattern_id);

        // Pattern mute column
        let mute_char = if pattern_muted { "M" } else { "·" };
        let mute_style = if is_cursor_row && cursor.col == 0 {
            theme::meta_cursor()
        } else if pattern_muted {
            Style::default().fg(theme::DIMMED)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!(" {mute_char} "), mute_style));

        // Pattern name
        let name = app
            .song
            .pattern(pattern_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let name_style = if pattern_muted {
            Style::default().fg(theme::DIMMED)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("{name:<10.10} "), name_style));

        // Bar cells
        for bar in 0..NUM_BARS {
            let col = bar + 1;
            let placed = app
                .song
                .arrangement
                .placements
                .iter()
                .any(|p| p.pattern_id == pattern_id && p.covers_bar(bar));

            let is_cursor = is_cursor_row && cursor.col == col;
            let is_selected = selection
                .map(|range| range.contains(Position::new(row, col)))
                .unwrap_or(false);
            let is_playhead = playhead_bar == Some(bar);

            let glyph = if placed { BAR_ON } else { BAR_OFF };
            let highlight = theme::highlight(is_cursor, is_selected, is_playhead);
            spans.push(Span::styled(glyph, theme::cell(bar, placed, highlight)));
        }

        lines.push(Line::from(spans));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            " no non-empty patterns yet",
            Style::default().fg(theme::DIMMED),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
