//! Transport bar: play state, tempo, pattern, vim mode and the latest
//! log message. Doubles as the text input line for tempo/rename entry.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Panel};
use crate::event_log::LogLevel;
use crate::mode::{AppMode, InputTarget};
use crate::playback::TransportMode;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title("modseq");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Text input takes over the bar while active
    if let AppMode::TextInput { target, .. } = &app.mode {
        let label = match target {
            InputTarget::Tempo => "tempo",
            InputTarget::ChannelRename { .. } => "rename",
        };
        let line = Line::from(vec![
            Span::styled(format!(" {label}: "), Style::default().fg(Color::Yellow)),
            Span::raw(app.text_input.value().to_string()),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
        return;
    }

    let play = if app.transport.playing {
        match app.transport.mode {
            TransportMode::Pattern => Span::styled("▶ PAT", Style::default().fg(Color::Green)),
            TransportMode::Arrangement => Span::styled("▶ ARR", Style::default().fg(Color::Green)),
        }
    } else {
        Span::styled("■", Style::default().fg(Color::DarkGray))
    };

    let vim_mode = match app.mode.current_panel() {
        Panel::ChannelRack => app.vim.channel_rack.mode(),
        Panel::PianoRoll => app.vim.piano_roll.mode(),
        Panel::Playlist => app.vim.playlist.mode(),
        Panel::Browser => app.vim.browser.mode(),
    };

    let mut spans = vec![
        Span::raw(" "),
        play,
        Span::raw("  "),
        Span::styled(
            format!("{:.0} bpm", app.song.bpm),
            Style::default().fg(Color::White),
        ),
        Span::raw("  "),
        Span::styled(
            format!("pattern {}", app.song.current_pattern_id + 1),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw("  "),
        Span::styled(
            format!("step {:>2}", app.transport.playhead_step()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(vim_mode.as_str(), Style::default().fg(Color::Cyan)),
    ];

    if let Some(entry) = app.event_log.latest() {
        let color = match entry.level {
            LogLevel::Info => Color::DarkGray,
            LogLevel::Error => Color::Red,
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(entry.message.clone(), Style::default().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}
