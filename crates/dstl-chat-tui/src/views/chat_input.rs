use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use super::border_style;
use crate::app::{App, Focus, InputMode};

/// Rows used by the input box, borders included.
pub fn height(app: &App) -> u16 {
    let lines = u16::try_from(app.input.lines().len()).unwrap_or(u16::MAX);
    lines.clamp(1, 6) + 2
}

pub fn render(frame: &mut Frame, input_area: Rect, hint_area: Rect, app: &mut App) {
    let focused = app.focus == Focus::Input;
    let title = match app.mode {
        InputMode::Compose => " Message ",
        InputMode::Rename(_) => " Rename conversation ",
    };

    app.input.set_block(
        Block::bordered()
            .title(title)
            .border_style(border_style(focused)),
    );
    app.input.set_cursor_style(if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    });
    frame.render_widget(&app.input, input_area);

    let dim = Style::default().fg(Color::DarkGray);
    let hint = match app.mode {
        InputMode::Compose => {
            // Sending is disabled while the draft is blank.
            let send_style = if app.controller.state().can_send() {
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
            } else {
                dim.add_modifier(Modifier::DIM)
            };
            Line::from(vec![
                Span::styled(" Press Enter to send", send_style),
                Span::styled("  ·  Shift+Enter for a new line", dim),
            ])
        }
        InputMode::Rename(_) => Line::from(Span::styled(" Enter to rename  ·  Esc to cancel", dim)),
    };
    frame.render_widget(Paragraph::new(hint), hint_area);
}
