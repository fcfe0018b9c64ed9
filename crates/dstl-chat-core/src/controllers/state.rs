use crate::models::{ConversationSummary, Message};

/// Action re-issued by [`super::ChatController::retry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryAction {
    /// Re-list conversations.
    Reload,
    /// Load the messages of this conversation again.
    Select(i64),
    /// Send the draft, which holds the text of the failed send.
    Send,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Loading(String),
    Error {
        message: String,
        retry: Option<RetryAction>,
    },
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error { .. })
    }
}

/// Where a pending send is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendTarget {
    Conversation(i64),
    /// No conversation exists yet; the first send of this view session
    /// creates one and later sends of the same session follow it there.
    Fresh(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutgoingState {
    Queued,
    Sending,
}

/// A user message the store has not acknowledged yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub local_id: u64,
    pub content: String,
    pub target: SendTarget,
    pub state: OutgoingState,
}

/// View state owned by [`super::ChatController`]. Front ends only read it.
#[derive(Clone, Debug, Default)]
pub struct ChatState {
    pub conversations: Vec<ConversationSummary>,
    pub active_conversation_id: Option<i64>,
    pub messages: Vec<Message>,
    pub draft: String,
    /// Sends in FIFO order; at most the first one is in flight.
    pub outbox: Vec<OutgoingMessage>,
    pub status: Status,
    /// Conversation whose messages are being fetched.
    pub loading_conversation: Option<i64>,
    /// Bumped whenever the message stream switches to another conversation
    /// or to a fresh chat.
    pub(crate) view_session: u64,
}

impl ChatState {
    pub fn active_conversation(&self) -> Option<&ConversationSummary> {
        let id = self.active_conversation_id?;
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn can_send(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    /// Pending sends that belong to the message stream currently shown.
    pub fn visible_outbox(&self) -> impl Iterator<Item = &OutgoingMessage> {
        self.outbox.iter().filter(|pending| self.shows(pending.target))
    }

    pub(crate) fn shows(&self, target: SendTarget) -> bool {
        match (target, self.active_conversation_id) {
            (SendTarget::Conversation(id), Some(active)) => id == active,
            (SendTarget::Fresh(session), None) => session == self.view_session,
            _ => false,
        }
    }
}
