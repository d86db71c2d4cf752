//! Sample browser panel: the samples directory tree.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Panel};

use super::render_panel_frame;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let title = if app.mode.is_browser_selection() {
        "Browser (select sample)"
    } else {
        "Browser"
    };
    let inner = render_panel_frame(frame, area, title, Panel::Browser, app);

    let focused = app.mode.current_panel() == Panel::Browser;
    let visible_rows = inner.height as usize;

    // Keep the cursor on screen
    let top = app
        .browser
        .cursor
        .saturating_sub(visible_rows.saturating_sub(1));

    let mut lines = Vec::new();
    for (idx, entry) in app
        .browser
        .visible_entries
        .iter()
        .enumerate()
        .skip(top)
        .take(visible_rows)
    {
        let indent = "  ".repeat(entry.depth);
        let (marker, color) = if entry.is_dir {
            let expanded = app.browser.expanded.contains(&entry.path);
            (if expanded { "▾ " } else { "▸ " }, Color::Yellow)
        } else {
            ("  ", Color::White)
        };

        let style = if focused && idx == app.browser.cursor {
            Style::default().bg(Color::Cyan).fg(Color::Black)
        } else {
            Style::default().fg(color)
        };

        lines.push(Line::from(Span::styled(
            format!("{indent}{marker}{}", entry.name),
            style,
        )));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            " no samples found",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
