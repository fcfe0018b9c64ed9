use dstl_chat_core::controllers::{RetryAction, Status};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::App;

const SPINNER: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];
const KEY_HELP: &str = "Tab focus · Ctrl+N new · F2 log · Ctrl+Q quit ";

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let status = status_line(&app.controller.state().status, app.spinner);

    let mut right = Vec::new();
    let errors = app.errors.error_count();
    let warnings = app.errors.warning_count();
    if errors + warnings > 0 {
        right.push(Span::styled(
            format!("⚠ {errors} errors, {warnings} warnings "),
            Style::default().fg(Color::Yellow),
        ));
    }
    right.push(Span::styled(KEY_HELP, Style::default().fg(Color::DarkGray)));
    let right = Line::from(right);

    let right_width = u16::try_from(right.width()).unwrap_or(u16::MAX);
    let [left_area, right_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(right_width)]).areas(area);

    frame.render_widget(Paragraph::new(status), left_area);
    frame.render_widget(Paragraph::new(right), right_area);
}

fn status_line(status: &Status, spinner: usize) -> Line<'static> {
    match status {
        Status::Idle => Line::from(Span::styled(" Ready", Style::default().fg(Color::DarkGray))),
        Status::Loading(label) => Line::from(vec![
            Span::styled(
                format!(" {} ", SPINNER[spinner % SPINNER.len()]),
                Style::default().fg(Color::Blue),
            ),
            Span::raw(format!("{label}…")),
        ]),
        Status::Error { message, retry } => {
            let mut spans = vec![Span::styled(
                format!(" ✗ {message}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )];
            let hint = match retry {
                Some(RetryAction::Send) => " · Ctrl+R resend",
                Some(_) => " · Ctrl+R retry",
                None => "",
            };
            spans.push(Span::styled(
                format!("{hint} · Esc dismiss"),
                Style::default().fg(Color::DarkGray),
            ));
            Line::from(spans)
        }
    }
}
