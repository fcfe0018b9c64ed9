use dstl_chat_core::models::{ErrorEntry, ErrorLevel};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};

use crate::app::App;

/// Overlay listing captured warnings and errors, most recent first.
pub fn render(frame: &mut Frame, app: &App) {
    let area = centered(frame.area(), 80, 70);
    let entries = app.errors.get_all_entries();

    let lines: Vec<Line> = if entries.is_empty() {
        vec![Line::from(Span::styled(
            "No errors or warnings",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        entries.iter().rev().map(entry_line).collect()
    };

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(" Errors & Warnings (Del to clear · Esc to close) ")),
        area,
    );
}

fn entry_line(entry: &ErrorEntry) -> Line<'static> {
    let (label, color) = match entry.level {
        ErrorLevel::Error => ("ERROR", Color::Red),
        ErrorLevel::Warning => ("WARN ", Color::Yellow),
    };

    let mut spans = vec![
        Span::styled(
            entry.timestamp.format("%H:%M:%S ").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {}", entry.message)),
    ];
    for (key, value) in &entry.fields {
        spans.push(Span::styled(
            format!(" {key}={value}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, row, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, cell, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(row);
    cell
}
