//! Channel rack grid: one row per channel, mute/name zones then 16 steps.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Panel};
use crate::coords::VimCol;
use crate::input::vim::Position;
use crate::playback::TransportMode;
use crate::song::ChannelKind;

use super::render_panel_frame;
use super::theme;

/// Width of the name zone in characters
const NAME_WIDTH: usize = 10;

/// Step cell glyphs (two columns wide)
const STEP_ON: &str = "██";
const STEP_OFF: &str = "  ";

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let inner = render_panel_frame(frame, area, "Channel Rack", Panel::ChannelRack, app);

    let cursor = &app.cursors.channel_rack;
    let cursor_vim = Position::new(cursor.channel, VimCol::from(cursor.col).0);
    let selection = app.vim.channel_rack.get_selection(cursor_vim);
    let focused = app.mode.current_panel() == Panel::ChannelRack;

    let playhead = (app.transport.playing && app.transport.mode == TransportMode::Pattern)
        .then(|| app.transport.playhead_step());

    let visible_rows = inner.height as usize;
    let views = app.song.channels_with_steps();

    let mut lines = Vec::new();
    for (idx, view) in views
        .iter()
        .enumerate()
        .skip(cursor.viewport_top)
        .take(visible_rows)
    {
        let mut spans = Vec::new();
        let is_cursor_row = focused && idx == cursor.channel;

        // Mute zone
        let mute_char = if view.channel.solo {
            "S"
        } else if view.channel.muted {
            "M"
        } else {
            "·"
        };
        let mute_style = if is_cursor_row && cursor.col.is_mute_zone() {
            theme::meta_cursor()
        } else if view.effectively_muted {
            Style::default().fg(theme::DIMMED)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!(" {mute_char} "), mute_style));

        // Name zone
        let name_style = if is_cursor_row && cursor.col.is_name_zone() {
            theme::meta_cursor()
        } else if view.effectively_muted {
            Style::default().fg(theme::DIMMED)
        } else if view.channel.kind == ChannelKind::Synth {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(
            format!("{:<w$.w$} ", view.channel.name, w = NAME_WIDTH),
            name_style,
        ));

        // Step cells
        for step in 0..view.steps.len() {
            let vim_col = VimCol::FIRST_STEP.0 + step;
            let is_cursor =
                is_cursor_row && cursor.col.to_step() == Some(crate::coords::StepIdx(step));
            let is_selected = selection
                .map(|range| range.contains(Position::new(idx, vim_col)))
                .unwrap_or(false);
            let is_playhead = playhead == Some(step);
            let on = view.steps[step];

            let glyph = if on { STEP_ON } else { STEP_OFF };
            let highlight = theme::highlight(is_cursor, is_selected, is_playhead);
            spans.push(Span::styled(glyph, theme::cell(step, on, highlight)));
            if (step + 1) % 4 == 0 && step + 1 < view.steps.len() {
                spans.push(Span::raw(" "));
            }
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
