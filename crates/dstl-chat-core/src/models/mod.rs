pub mod conversation;
pub mod error_store;
pub mod message;
mod timestamp;

pub use conversation::{Conversation, ConversationSummary, NewConversation};
pub use error_store::{ErrorEntry, ErrorLevel, ErrorStore};
pub use message::{Message, NewMessage, Role};
