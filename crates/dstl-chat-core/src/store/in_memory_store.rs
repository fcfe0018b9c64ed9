use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;

use super::conversation_store::{BoxFuture, ConversationStore, StoreOperation};
use super::error::{StoreError, StoreResult};
use crate::models::{Conversation, ConversationSummary, Message, NewMessage, Role};

/// In-memory conversation store.
/// Useful for testing and for running the client without a backend.
#[derive(Clone, Default)]
pub struct InMemoryConversationStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    conversations: BTreeMap<i64, Conversation>,
    last_conversation_id: i64,
    last_message_id: i64,
    pending_failures: Vec<StoreOperation>,
    calls: HashMap<StoreOperation, usize>,
    auto_reply: Option<String>,
    latency: Option<Duration>,
}

impl Inner {
    fn next_message(&mut self, conversation_id: i64, role: Role, content: String) -> Message {
        self.last_message_id += 1;
        Message {
            id: Some(self.last_message_id),
            role,
            content,
            created_at: Some(Utc::now()),
            conversation_id: Some(conversation_id),
        }
    }

    fn insert_conversation(&mut self, title: Option<String>) -> ConversationSummary {
        self.last_conversation_id += 1;
        let conversation = Conversation {
            id: self.last_conversation_id,
            title,
            created_at: Utc::now(),
            messages: Vec::new(),
        };
        let summary = conversation.summary();
        self.conversations.insert(conversation.id, conversation);
        summary
    }

    fn append(&mut self, conversation_id: i64, role: Role, content: String) -> StoreResult<Message> {
        if !self.conversations.contains_key(&conversation_id) {
            return Err(StoreError::NotFound(conversation_id));
        }
        let message = self.next_message(conversation_id, role, content);
        if let Some(conversation) = self.conversations.get_mut(&conversation_id) {
            conversation.messages.push(message.clone());
        }
        Ok(message)
    }
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every user message with a persisted assistant message, returning
    /// the assistant message instead of the echo (as the reference backend does).
    pub fn with_auto_reply(self, text: impl Into<String>) -> Self {
        self.inner.lock().auto_reply = Some(text.into());
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.inner.lock().latency = Some(latency);
        self
    }

    /// Make the next call of `operation` fail with HTTP 503.
    pub fn fail_next(&self, operation: StoreOperation) {
        self.inner.lock().pending_failures.push(operation);
    }

    /// Number of calls made for `operation`, failed ones included.
    pub fn calls(&self, operation: StoreOperation) -> usize {
        self.inner.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.inner.lock().calls.values().sum()
    }

    /// Seed a conversation without counting it as a client call.
    pub fn seed_conversation(&self, title: Option<&str>) -> ConversationSummary {
        self.inner.lock().insert_conversation(title.map(String::from))
    }

    /// Seed a message without counting it as a client call.
    pub fn seed_message(
        &self,
        conversation_id: i64,
        role: Role,
        content: &str,
    ) -> StoreResult<Message> {
        self.inner
            .lock()
            .append(conversation_id, role, content.to_string())
    }

    pub fn conversation_count(&self) -> usize {
        self.inner.lock().conversations.len()
    }

    fn run<T, F>(&self, operation: StoreOperation, f: F) -> BoxFuture<'static, StoreResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Inner) -> StoreResult<T> + Send + 'static,
    {
        let inner = self.inner.clone();
        let latency = self.inner.lock().latency;

        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            let mut inner = inner.lock();
            *inner.calls.entry(operation).or_insert(0) += 1;

            if let Some(pos) = inner.pending_failures.iter().position(|op| *op == operation) {
                inner.pending_failures.remove(pos);
                return Err(StoreError::Fetch {
                    operation,
                    status: 503,
                });
            }

            f(&mut inner)
        })
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn list_conversations(&self) -> BoxFuture<'static, StoreResult<Vec<ConversationSummary>>> {
        self.run(StoreOperation::ListConversations, |inner| {
            Ok(inner
                .conversations
                .values()
                .map(Conversation::summary)
                .collect())
        })
    }

    fn get_messages(&self, conversation_id: i64) -> BoxFuture<'static, StoreResult<Vec<Message>>> {
        self.run(StoreOperation::GetMessages, move |inner| {
            inner
                .conversations
                .get(&conversation_id)
                .map(|c| c.messages.clone())
                .ok_or(StoreError::NotFound(conversation_id))
        })
    }

    fn create_conversation(
        &self,
        title: Option<String>,
    ) -> BoxFuture<'static, StoreResult<ConversationSummary>> {
        self.run(StoreOperation::CreateConversation, move |inner| {
            Ok(inner.insert_conversation(title))
        })
    }

    fn update_conversation(
        &self,
        conversation: ConversationSummary,
    ) -> BoxFuture<'static, StoreResult<ConversationSummary>> {
        self.run(StoreOperation::UpdateConversation, move |inner| {
            let stored = inner
                .conversations
                .get_mut(&conversation.id)
                .ok_or(StoreError::NotFound(conversation.id))?;
            // A null title leaves the stored one untouched.
            if conversation.title.is_some() {
                stored.title = conversation.title;
            }
            Ok(stored.summary())
        })
    }

    fn append_message(
        &self,
        conversation_id: i64,
        message: NewMessage,
    ) -> BoxFuture<'static, StoreResult<Message>> {
        self.run(StoreOperation::AppendMessage, move |inner| {
            let stored = inner.append(conversation_id, message.role, message.content)?;
            match (stored.role, inner.auto_reply.clone()) {
                (Role::User, Some(reply)) => inner.append(conversation_id, Role::Assistant, reply),
                _ => Ok(stored),
            }
        })
    }
}
