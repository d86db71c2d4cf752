//! Piano roll grid: pitch rows (C6 at the top) x 16 steps for the
//! focused channel.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Panel};
use crate::coords::MidiPitch;
use crate::input::vim::Position;
use crate::playback::TransportMode;
use crate::song::NUM_STEPS;

use super::render_panel_frame;
use super::theme;

/// Note cell glyphs (two columns wide)
const NOTE_START: &str = "██";
const NOTE_TAIL: &str = "──";
const NOTE_PENDING: &str = "░░";
const NOTE_NONE: &str = "  ";

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

fn pitch_label(pitch: u8) -> String {
    let octave = pitch as i32 / 12 - 1;
    format!("{:>2}{}", NOTE_NAMES[pitch as usize % 12], octave)
}

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let channel_name = app
        .song
        .channels
        .get(app.cursors.channel_rack.channel)
        .map(|c| c.name.clone())
        .unwrap_or_default();
    let title = format!("Piano Roll - {channel_name}");
    let inner = render_panel_frame(frame, area, &title, Panel::PianoRoll, app);

    let cursor = &app.cursors.piano_roll;
    let cursor_vim = Position::new(MidiPitch(cursor.pitch).to_piano_row(), cursor.step);
    let selection = app.vim.piano_roll.get_selection(cursor_vim);
    let focused = app.mode.current_panel() == Panel::PianoRoll;

    let playhead = (app.transport.playing && app.transport.mode == TransportMode::Pattern)
        .then(|| app.transport.playhead_step());

    let channel = app.cursors.channel_rack.channel;
    let pattern = app.song.current_pattern();

    let top = cursor.viewport_top.min(MidiPitch::PIANO_MAX.0);
    let visible_rows = inner.height as usize;

    let mut lines = Vec::new();
    for offset in 0..visible_rows {
        let Some(pitch) = top.checked_sub(offset as u8) else {
            break;
        };
        if pitch < MidiPitch::PIANO_MIN.0 {
            break;
        }
        let row = MidiPitch(pitch).to_piano_row();

        let mut spans = Vec::new();
        let is_black_key = matches!(pitch % 12, 1 | 3 | 6 | 8 | 10);
        let label_style = if is_black_key {
            Style::default().fg(theme::DIMMED)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("{} ", pitch_label(pitch)), label_style));

        for step in 0..NUM_STEPS {
            let note = pattern.and_then(|p| p.note_at(channel, pitch, step));
            let is_note_start = note.map(|n| n.start_step == step).unwrap_or(false);
            let is_pending = app
                .pending_note
                .map(|p| p.pitch == pitch && p.start_step == step)
                .unwrap_or(false);

            let is_cursor = focused && pitch == cursor.pitch && step == cursor.step;
            let is_selected = selection
                .map(|range| range.contains(Position::new(row, step)))
                .unwrap_or(false);
            let is_playhead = playhead == Some(step);
            let occupied = note.is_some() || is_pending;

            let glyph = if is_pending {
                NOTE_PENDING
            } else if note.is_some() && !is_note_start {
                NOTE_TAIL
            } else if occupied {
                NOTE_START
            } else {
                NOTE_NONE
            };
            let highlight = theme::highlight(is_cursor, is_selected, is_playhead);
            spans.push(Span::styled(glyph, theme::cell(step, occupied, highlight)));
            if (step + 1) % 4 == 0 && step + 1 < NUM_STEPS {
                spans.push(Span::raw(" "));
            }
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
