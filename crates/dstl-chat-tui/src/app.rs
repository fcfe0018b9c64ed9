use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dstl_chat_core::controllers::{ChatController, Outcome};
use dstl_chat_core::models::ErrorStore;
use ratatui::style::{Modifier, Style};
use tracing::debug;
use tui_textarea::{CursorMove, TextArea};

/// Lines moved per PageUp/PageDown.
const SCROLL_STEP: u16 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Input,
}

/// What the input box is currently editing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Compose,
    Rename(i64),
}

/// Terminal front end state. Everything about the chat itself lives in the
/// controller; this only tracks focus, selection and the input widget.
pub struct App {
    pub(crate) controller: ChatController,
    pub(crate) input: TextArea<'static>,
    pub(crate) focus: Focus,
    pub(crate) mode: InputMode,
    /// 0 is the "+ New Chat" entry, `i + 1` is `conversations[i]`.
    pub(crate) sidebar_index: usize,
    /// Lines scrolled up from the newest message.
    pub(crate) scroll: u16,
    pub(crate) show_error_log: bool,
    pub(crate) errors: ErrorStore,
    pub(crate) spinner: usize,
    should_quit: bool,
}

impl App {
    pub fn new(controller: ChatController, errors: ErrorStore) -> Self {
        Self {
            controller,
            input: new_input(""),
            focus: Focus::Input,
            mode: InputMode::Compose,
            sidebar_index: 0,
            scroll: 0,
            show_error_log: false,
            errors,
            spinner: 0,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn tick(&mut self) {
        self.spinner = self.spinner.wrapping_add(1);
    }

    pub fn apply(&mut self, outcome: Outcome) {
        let before = self.controller.state().messages.len();
        self.controller.apply(outcome);
        if self.controller.state().messages.len() != before {
            self.scroll = 0;
        }
        self.clamp_sidebar();
        self.sync_input_from_state();
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Paste(text) if self.focus == Focus::Input => {
                self.input.insert_str(text);
                self.sync_draft();
            }
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                debug!("Quit requested");
                self.should_quit = true;
            }
            KeyCode::Char('n') if ctrl => self.start_new_chat(),
            KeyCode::Char('r') if ctrl => {
                self.controller.retry();
                self.sync_input_from_state();
            }
            KeyCode::F(2) => self.show_error_log = !self.show_error_log,
            KeyCode::Delete if self.show_error_log => {
                debug!("Clearing error log");
                self.errors.clear();
            }
            KeyCode::Esc => self.escape(),
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Sidebar => Focus::Input,
                    Focus::Input => Focus::Sidebar,
                };
            }
            KeyCode::PageUp => self.scroll = self.scroll.saturating_add(SCROLL_STEP),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(SCROLL_STEP),
            _ => match self.focus {
                Focus::Sidebar => self.handle_sidebar_key(key),
                Focus::Input => self.handle_input_key(key),
            },
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.sidebar_index = self.sidebar_index.saturating_sub(1),
            KeyCode::Down => {
                self.sidebar_index += 1;
                self.clamp_sidebar();
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('n') => self.start_new_chat(),
            KeyCode::Char('r') => self.begin_rename(),
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let newline = match key.code {
            KeyCode::Enter => key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT),
            // Terminals without keyboard enhancement report Ctrl+J for a bare LF.
            KeyCode::Char('j') => key.modifiers.contains(KeyModifiers::CONTROL),
            _ => false,
        };

        if newline {
            self.input.insert_newline();
            self.sync_draft();
        } else if key.code == KeyCode::Enter {
            self.submit();
        } else if self.input.input(key) {
            self.sync_draft();
        }
    }

    fn submit(&mut self) {
        match self.mode {
            InputMode::Compose => {
                self.controller.send();
                self.scroll = 0;
            }
            InputMode::Rename(conversation_id) => {
                let title = self.input_text();
                self.controller.rename_conversation(conversation_id, &title);
                self.mode = InputMode::Compose;
                self.focus = Focus::Sidebar;
            }
        }
        self.sync_input_from_state();
    }

    fn escape(&mut self) {
        if self.show_error_log {
            self.show_error_log = false;
        } else if matches!(self.mode, InputMode::Rename(_)) {
            self.mode = InputMode::Compose;
            self.focus = Focus::Sidebar;
            self.sync_input_from_state();
        } else {
            self.controller.dismiss_error();
        }
    }

    fn start_new_chat(&mut self) {
        self.controller.new_chat();
        self.sidebar_index = 0;
        self.scroll = 0;
        self.focus = Focus::Input;
    }

    fn open_selected(&mut self) {
        let Some(index) = self.sidebar_index.checked_sub(1) else {
            self.start_new_chat();
            return;
        };
        if let Some(conversation) = self.controller.state().conversations.get(index) {
            let id = conversation.id;
            self.controller.select_conversation(id);
            self.scroll = 0;
            self.focus = Focus::Input;
        }
    }

    fn begin_rename(&mut self) {
        let Some(index) = self.sidebar_index.checked_sub(1) else {
            return;
        };
        let Some(conversation) = self.controller.state().conversations.get(index) else {
            return;
        };
        self.mode = InputMode::Rename(conversation.id);
        self.input = new_input(conversation.title.as_deref().unwrap_or_default());
        self.focus = Focus::Input;
    }

    fn clamp_sidebar(&mut self) {
        let last = self.controller.state().conversations.len();
        self.sidebar_index = self.sidebar_index.min(last);
    }

    pub(crate) fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    fn sync_draft(&mut self) {
        if self.mode == InputMode::Compose {
            let text = self.input_text();
            self.controller.set_draft(text);
        }
    }

    /// The controller clears the draft on send and restores it when a send
    /// fails; mirror that into the input box.
    fn sync_input_from_state(&mut self) {
        if self.mode != InputMode::Compose {
            return;
        }
        let draft = &self.controller.state().draft;
        if self.input_text() != *draft {
            self.input = new_input(draft);
        }
    }
}

fn new_input(text: &str) -> TextArea<'static> {
    let mut input = TextArea::new(text.split('\n').map(String::from).collect());
    input.set_cursor_line_style(Style::default());
    input.set_placeholder_text("Type a message…");
    input.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
    input.move_cursor(CursorMove::Bottom);
    input.move_cursor(CursorMove::End);
    input
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use chrono::Local;
    use dstl_chat_core::models::{ErrorEntry, ErrorLevel, NewMessage, Role};
    use dstl_chat_core::store::{ConversationStore, InMemoryConversationStore, StoreOperation};

    use super::*;

    fn app(store: &InMemoryConversationStore) -> App {
        let controller = ChatController::new(Arc::new(store.clone()), None);
        App::new(controller, ErrorStore::default())
    }

    async fn settle(app: &mut App) {
        while !app.controller.is_idle() {
            let Some(outcome) = app.controller.next_outcome().await else {
                break;
            };
            app.apply(outcome);
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_enter_sends_and_clears_input() {
        let store = InMemoryConversationStore::new();
        let mut app = app(&store);

        type_text(&mut app, "hi");
        assert_eq!(app.controller.state().draft, "hi");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_text(), "");
        settle(&mut app).await;

        let state = app.controller.state();
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].role, Role::User);
        assert_eq!(state.messages[0].content, "hi");
    }

    #[tokio::test]
    async fn test_modified_enter_inserts_newline() {
        let store = InMemoryConversationStore::new();
        let mut app = app(&store);

        type_text(&mut app, "a");
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&mut app, "b");
        app.handle_key(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL));
        type_text(&mut app, "c");

        assert_eq!(app.controller.state().draft, "a\nb\nc");
        assert!(app.controller.state().outbox.is_empty());
        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_enter_on_blank_draft_does_nothing() {
        let store = InMemoryConversationStore::new();
        let mut app = app(&store);

        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert!(app.controller.is_idle());
        assert!(app.controller.state().outbox.is_empty());
        assert_eq!(app.input_text(), "   ");
    }

    #[tokio::test]
    async fn test_failed_send_returns_text_to_input() {
        let store = InMemoryConversationStore::new();
        store.fail_next(StoreOperation::CreateConversation);
        let mut app = app(&store);

        type_text(&mut app, "hi");
        press(&mut app, KeyCode::Enter);
        settle(&mut app).await;

        assert_eq!(app.input_text(), "hi");
        assert!(app.controller.state().status.is_error());

        press(&mut app, KeyCode::Esc);
        assert!(!app.controller.state().status.is_error());
    }

    #[tokio::test]
    async fn test_sidebar_opens_conversation() {
        let store = InMemoryConversationStore::new();
        store.seed_conversation(Some("first"));
        let second = store.seed_conversation(Some("second"));
        store.append_message(second.id, NewMessage::user("there")).await.unwrap();
        let mut app = app(&store);
        app.controller.initialize();
        settle(&mut app).await;

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Sidebar);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.sidebar_index, 2);

        press(&mut app, KeyCode::Enter);
        settle(&mut app).await;
        assert_eq!(app.focus, Focus::Input);
        assert_eq!(app.controller.state().active_conversation_id, Some(second.id));
        assert_eq!(app.controller.state().messages[0].content, "there");

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.controller.state().active_conversation_id, None);
        assert_eq!(app.sidebar_index, 0);
    }

    #[tokio::test]
    async fn test_rename_from_sidebar_keeps_draft() {
        let store = InMemoryConversationStore::new();
        store.seed_conversation(None);
        let mut app = app(&store);
        app.controller.initialize();
        settle(&mut app).await;

        type_text(&mut app, "draft");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.mode, InputMode::Rename(1));
        assert_eq!(app.input_text(), "");

        type_text(&mut app, "Trip");
        press(&mut app, KeyCode::Enter);
        settle(&mut app).await;

        assert_eq!(app.mode, InputMode::Compose);
        assert_eq!(app.controller.state().conversations[0].title.as_deref(), Some("Trip"));
        assert_eq!(app.input_text(), "draft");
        assert_eq!(app.controller.state().draft, "draft");
    }

    #[test]
    fn test_quit_and_error_log_keys() {
        let store = InMemoryConversationStore::new();
        let mut app = app(&store);

        press(&mut app, KeyCode::F(2));
        assert!(app.show_error_log);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_error_log);

        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
    }

    #[test]
    fn test_delete_clears_open_error_log() {
        let store = InMemoryConversationStore::new();
        let mut app = app(&store);
        app.errors.add_entry(ErrorEntry {
            timestamp: Local::now(),
            level: ErrorLevel::Error,
            message: "Failed to fetch conversations".to_string(),
            target: "dstl_chat_core".to_string(),
            fields: BTreeMap::new(),
        });

        // Closed overlay: Delete edits the input instead.
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.errors.error_count(), 1);

        press(&mut app, KeyCode::F(2));
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.errors.error_count(), 0);
        assert!(app.errors.get_all_entries().is_empty());
    }
}
