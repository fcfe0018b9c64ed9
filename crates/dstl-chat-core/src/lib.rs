//! Core of the DSTL chat client: the conversation store client, the
//! view-state controller that keeps the sidebar, active conversation and
//! message history in sync, and the markdown renderer for message bodies.
//!
//! Nothing in this crate touches the terminal; the `dstl-chat-tui` crate
//! renders [`controllers::ChatState`] and forwards user intents back to
//! [`controllers::ChatController`].

pub mod controllers;
pub mod markdown;
pub mod models;
pub mod services;
pub mod settings;
pub mod store;

pub use controllers::{ChatController, ChatState, RetryAction, Status};
pub use models::{Conversation, ConversationSummary, Message, NewMessage, Role};
pub use store::{ConversationStore, HttpConversationStore, InMemoryConversationStore, StoreError};
