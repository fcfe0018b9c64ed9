use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::models::{Message, Role};
use crate::store::BoxFuture;

/// Produces the assistant's answer to the latest user message.
///
/// The controller calls this after a user message has been stored and
/// appends whatever comes back to the conversation view. `Ok(None)` means
/// "no reply".
pub trait ReplyGenerator: Send + Sync + 'static {
    fn generate(
        &self,
        conversation_id: i64,
        history: Vec<Message>,
    ) -> BoxFuture<'static, Result<Option<Message>>>;
}

/// Answers every message with the same text after a fixed delay.
/// The reply is local only; it is never written to the store.
#[derive(Clone, Debug)]
pub struct CannedReply {
    text: String,
    delay: Duration,
}

impl CannedReply {
    pub const DEFAULT_TEXT: &'static str = "This is a placeholder response.";

    pub fn new(text: impl Into<String>, delay: Duration) -> Self {
        Self {
            text: text.into(),
            delay,
        }
    }
}

impl Default for CannedReply {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TEXT, Duration::from_millis(1000))
    }
}

impl ReplyGenerator for CannedReply {
    fn generate(
        &self,
        conversation_id: i64,
        history: Vec<Message>,
    ) -> BoxFuture<'static, Result<Option<Message>>> {
        let text = self.text.clone();
        let delay = self.delay;

        Box::pin(async move {
            debug!(conversation_id, history_len = history.len(), "generating canned reply");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(Some(Message::transient(
                Role::Assistant,
                text,
                Some(conversation_id),
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_reply_is_transient_assistant_message() {
        let generator = CannedReply::new("ok", Duration::ZERO);
        let reply = generator.generate(3, Vec::new()).await.unwrap().unwrap();

        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "ok");
        assert_eq!(reply.conversation_id, Some(3));
        assert!(!reply.is_persisted());
    }

    #[tokio::test]
    async fn test_canned_reply_waits_for_delay() {
        let generator = CannedReply::new("later", Duration::from_millis(30));
        let started = std::time::Instant::now();
        generator.generate(1, Vec::new()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
