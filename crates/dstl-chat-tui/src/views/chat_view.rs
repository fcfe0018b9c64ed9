use dstl_chat_core::Role;
use dstl_chat_core::controllers::{ChatState, OutgoingState};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};

use super::border_style;
use super::message_component::{message_lines, pending_caption};
use crate::app::App;

const SPINNER: [&str; 4] = ["", ".", "..", "..."];

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.controller.state();
    let title = state
        .active_conversation()
        .map(|c| c.display_title())
        .unwrap_or_else(|| "New Chat".to_string());

    let block = Block::bordered()
        .title(format!(" {title} "))
        .border_style(border_style(false));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.messages.is_empty() && state.visible_outbox().next().is_none() {
        if state.loading_conversation.is_some() {
            render_centered(frame, inner, vec![Line::from("Loading conversation…").dark_gray()]);
        } else {
            render_welcome(frame, inner);
        }
        return;
    }

    let lines = conversation_lines(state, inner.width, app.spinner);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let bottom = total.saturating_sub(inner.height);
    let offset = bottom.saturating_sub(app.scroll);

    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), inner);
}

fn conversation_lines(state: &ChatState, width: u16, spinner: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in &state.messages {
        lines.extend(message_lines(&message.content, message.role, width, false));
        lines.push(Line::default());
    }

    for pending in state.visible_outbox() {
        lines.extend(message_lines(&pending.content, Role::User, width, true));
        let label = match pending.state {
            OutgoingState::Sending => format!("sending{}", SPINNER[spinner % SPINNER.len()]),
            OutgoingState::Queued => "queued".to_string(),
        };
        lines.push(pending_caption(&label, Role::User, width));
        lines.push(Line::default());
    }

    lines
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    render_centered(
        frame,
        area,
        vec![
            Line::from("Welcome to the DSTL Chat App").bold(),
            Line::default(),
            Line::from("Start a conversation!").dark_gray(),
        ],
    );
}

fn render_centered(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(area);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), middle);
}
