pub mod chat_input;
pub mod chat_view;
pub mod error_log_dialog;
pub mod line_wrapper;
pub mod message_component;
pub mod sidebar_view;
pub mod status_bar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};

use crate::app::App;

/// Draw the whole screen: sidebar on the left, message stream and input on
/// the right, status bar along the bottom.
pub fn render(frame: &mut Frame, app: &mut App) {
    let [body, status] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());
    let [sidebar, main] = Layout::horizontal([
        Constraint::Length(sidebar_view::SIDEBAR_WIDTH),
        Constraint::Min(0),
    ])
    .areas(body);
    let [messages, input, hint] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(chat_input::height(app)),
        Constraint::Length(1),
    ])
    .areas(main);

    sidebar_view::render(frame, sidebar, app);
    chat_view::render(frame, messages, app);
    chat_input::render(frame, input, hint, app);
    status_bar::render(frame, status, app);

    if app.show_error_log {
        error_log_dialog::render(frame, app);
    }
}

pub(crate) fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Blue)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}
