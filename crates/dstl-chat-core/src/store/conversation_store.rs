use std::fmt;
use std::future::Future;
use std::pin::Pin;

use super::error::StoreResult;
use crate::models::{ConversationSummary, Message, NewMessage};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The operations the client performs against the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ListConversations,
    GetMessages,
    CreateConversation,
    UpdateConversation,
    AppendMessage,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StoreOperation::ListConversations => "fetch conversations",
            StoreOperation::GetMessages => "load conversation messages",
            StoreOperation::CreateConversation => "create conversation",
            StoreOperation::UpdateConversation => "update conversation",
            StoreOperation::AppendMessage => "send message",
        };
        f.write_str(label)
    }
}

/// Remote conversation/message store.
///
/// Every call is a single attempt: no retries, no caching. The returned
/// futures own everything they need so they can be spawned.
pub trait ConversationStore: Send + Sync + 'static {
    /// Index of all conversations (no messages).
    fn list_conversations(&self) -> BoxFuture<'static, StoreResult<Vec<ConversationSummary>>>;

    /// Messages of one conversation in chronological order.
    fn get_messages(&self, conversation_id: i64) -> BoxFuture<'static, StoreResult<Vec<Message>>>;

    /// Create a conversation; the store assigns `id` and `created_at`.
    fn create_conversation(
        &self,
        title: Option<String>,
    ) -> BoxFuture<'static, StoreResult<ConversationSummary>>;

    /// Replace a conversation's metadata (currently only the title is honoured).
    fn update_conversation(
        &self,
        conversation: ConversationSummary,
    ) -> BoxFuture<'static, StoreResult<ConversationSummary>>;

    /// Append a message; the store assigns `id` and `created_at`.
    fn append_message(
        &self,
        conversation_id: i64,
        message: NewMessage,
    ) -> BoxFuture<'static, StoreResult<Message>>;
}
