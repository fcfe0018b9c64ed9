use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, ListState};

use super::border_style;
use crate::app::{App, Focus};

pub const SIDEBAR_WIDTH: u16 = 30;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.controller.state();
    let focused = app.focus == Focus::Sidebar;

    let mut items = vec![ListItem::new(Line::from(Span::styled(
        "+ New Chat",
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
    )))];

    if state.conversations.is_empty() {
        items.push(ListItem::new(Line::from("No conversations yet").dark_gray().italic()));
    }

    for conversation in &state.conversations {
        let active = state.active_conversation_id == Some(conversation.id);
        let marker = if state.loading_conversation == Some(conversation.id) {
            "… "
        } else if active {
            "▶ "
        } else {
            "  "
        };
        let title_style = if active {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        items.push(ListItem::new(vec![
            Line::from(vec![
                Span::raw(marker),
                Span::styled(conversation.display_title(), title_style),
            ]),
            Line::from(format!("  {}", conversation.display_date())).dark_gray(),
        ]));
    }

    let highlight = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().bg(Color::DarkGray)
    };
    let list = List::new(items)
        .block(
            Block::bordered()
                .title(Line::from(" DSTL Chat App ").bold())
                .border_style(border_style(focused)),
        )
        .highlight_style(highlight);

    let mut list_state = ListState::default().with_selected(Some(app.sidebar_index));
    frame.render_stateful_widget(list, area, &mut list_state);
}
