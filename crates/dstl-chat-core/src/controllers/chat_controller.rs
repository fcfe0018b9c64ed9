use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::state::{ChatState, OutgoingMessage, OutgoingState, RetryAction, SendTarget, Status};
use crate::models::{ConversationSummary, Message, NewMessage, Role};
use crate::services::ReplyGenerator;
use crate::store::{ConversationStore, StoreResult};

/// Result of a store call or reply started by the controller.
///
/// Produced by [`ChatController::next_outcome`] and folded into the state by
/// [`ChatController::apply`].
#[derive(Debug)]
pub struct Outcome(OutcomeKind);

#[derive(Debug)]
enum OutcomeKind {
    Conversations {
        generation: u64,
        result: StoreResult<Vec<ConversationSummary>>,
    },
    Messages {
        conversation_id: i64,
        seq: u64,
        result: StoreResult<Vec<Message>>,
    },
    Created {
        local_id: u64,
        session: u64,
        result: StoreResult<ConversationSummary>,
    },
    Appended {
        local_id: u64,
        conversation_id: i64,
        created: bool,
        result: StoreResult<Message>,
    },
    Reply {
        conversation_id: i64,
        result: anyhow::Result<Option<Message>>,
    },
    Renamed {
        conversation_id: i64,
        result: StoreResult<ConversationSummary>,
    },
}

/// Owns [`ChatState`] and is its only writer.
///
/// Every operation changes the state synchronously and starts at most one
/// store call on the tokio runtime. The call's result comes back through
/// [`next_outcome`](Self::next_outcome) and is applied with
/// [`apply`](Self::apply), so state is only ever mutated from the caller's
/// task.
pub struct ChatController {
    state: ChatState,
    store: Arc<dyn ConversationStore>,
    replies: Option<Arc<dyn ReplyGenerator>>,
    tx: mpsc::UnboundedSender<Outcome>,
    rx: mpsc::UnboundedReceiver<Outcome>,
    in_flight: usize,
    select_seq: u64,
    /// Bumped whenever the sidebar changes locally; a listing requested
    /// before the bump is merged instead of replacing the sidebar.
    list_generation: u64,
    next_local_id: u64,
    sending: bool,
}

impl ChatController {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        replies: Option<Arc<dyn ReplyGenerator>>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: ChatState::default(),
            store,
            replies,
            tx,
            rx,
            in_flight: 0,
            select_seq: 0,
            list_generation: 0,
            next_local_id: 0,
            sending: false,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// No store call or reply is outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub fn initialize(&mut self) {
        info!("Starting conversation load");
        self.refresh_conversations();
    }

    pub fn refresh_conversations(&mut self) {
        debug!("Listing conversations");
        self.state.status = Status::Loading("Loading conversations".to_string());
        let generation = self.list_generation;
        let request = self.store.list_conversations();
        self.spawn(request, move |result| OutcomeKind::Conversations { generation, result });
    }

    pub fn select_conversation(&mut self, conversation_id: i64) {
        debug!(conv_id = conversation_id, "Selecting conversation");
        self.select_seq += 1;
        let seq = self.select_seq;
        self.state.loading_conversation = Some(conversation_id);
        self.state.status = Status::Loading("Loading conversation".to_string());

        let request = self.store.get_messages(conversation_id);
        self.spawn(request, move |result| OutcomeKind::Messages {
            conversation_id,
            seq,
            result,
        });
    }

    pub fn new_chat(&mut self) {
        info!("Starting new chat");
        // Invalidates any select still in flight.
        self.select_seq += 1;
        self.state.loading_conversation = None;
        self.state.active_conversation_id = None;
        self.state.messages.clear();
        self.state.view_session += 1;
        self.state.status = Status::Idle;
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.draft = text.into();
    }

    /// Send the current draft. A blank draft is ignored.
    pub fn send(&mut self) {
        if !self.state.can_send() {
            return;
        }

        let content = std::mem::take(&mut self.state.draft);
        let target = match self.state.active_conversation_id {
            Some(id) => SendTarget::Conversation(id),
            None => SendTarget::Fresh(self.state.view_session),
        };
        self.next_local_id += 1;
        debug!(local_id = self.next_local_id, ?target, "Queueing message");

        self.state.outbox.push(OutgoingMessage {
            local_id: self.next_local_id,
            content,
            target,
            state: OutgoingState::Queued,
        });
        self.pump_outbox();
    }

    pub fn rename_conversation(&mut self, conversation_id: i64, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        let Some(existing) = self
            .state
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
        else {
            warn!(conv_id = conversation_id, "Rename requested for unknown conversation");
            return;
        };

        debug!(conv_id = conversation_id, title, "Renaming conversation");
        let updated = ConversationSummary {
            title: Some(title.to_string()),
            ..existing.clone()
        };
        let request = self.store.update_conversation(updated);
        self.spawn(request, move |result| OutcomeKind::Renamed {
            conversation_id,
            result,
        });
    }

    /// Re-issue the action attached to the current error, if any.
    pub fn retry(&mut self) {
        let Status::Error {
            retry: Some(action),
            ..
        } = self.state.status
        else {
            return;
        };

        info!(?action, "Retrying");
        self.state.status = Status::Idle;
        match action {
            RetryAction::Reload => self.refresh_conversations(),
            RetryAction::Select(id) => self.select_conversation(id),
            RetryAction::Send => self.send(),
        }
    }

    pub fn dismiss_error(&mut self) {
        if self.state.status.is_error() {
            self.state.status = Status::Idle;
        }
    }

    /// Wait for the next finished request. Never resolves while idle.
    pub async fn next_outcome(&mut self) -> Option<Outcome> {
        self.rx.recv().await
    }

    /// Apply outcomes until nothing is outstanding.
    pub async fn run_until_idle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(outcome) => self.apply(outcome),
                None => break,
            }
        }
    }

    pub fn apply(&mut self, outcome: Outcome) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome.0 {
            OutcomeKind::Conversations { generation, result } => {
                self.on_conversations(generation, result)
            }
            OutcomeKind::Messages {
                conversation_id,
                seq,
                result,
            } => self.on_messages(conversation_id, seq, result),
            OutcomeKind::Created {
                local_id,
                session,
                result,
            } => self.on_created(local_id, session, result),
            OutcomeKind::Appended {
                local_id,
                conversation_id,
                created,
                result,
            } => self.on_appended(local_id, conversation_id, created, result),
            OutcomeKind::Reply {
                conversation_id,
                result,
            } => self.on_reply(conversation_id, result),
            OutcomeKind::Renamed {
                conversation_id,
                result,
            } => self.on_renamed(conversation_id, result),
        }
    }

    fn on_conversations(
        &mut self,
        generation: u64,
        result: StoreResult<Vec<ConversationSummary>>,
    ) {
        match result {
            Ok(conversations) => {
                info!(count = conversations.len(), "Loaded conversations");
                if generation == self.list_generation {
                    self.state.conversations = conversations;
                } else {
                    debug!("Merging listing requested before a local change");
                    self.merge_conversations(conversations);
                }
                self.clear_loading();
            }
            Err(e) => {
                warn!(error = ?e, "Failed to fetch conversations");
                self.fail(e.to_string(), Some(RetryAction::Reload));
            }
        }
    }

    fn on_messages(&mut self, conversation_id: i64, seq: u64, result: StoreResult<Vec<Message>>) {
        if seq != self.select_seq {
            debug!(conv_id = conversation_id, "Discarding stale conversation load");
            return;
        }
        self.state.loading_conversation = None;

        match result {
            Ok(messages) => {
                info!(conv_id = conversation_id, count = messages.len(), "Loaded conversation");
                self.state.active_conversation_id = Some(conversation_id);
                self.state.messages = messages;
                self.state.view_session += 1;
                self.clear_loading();
            }
            Err(e) => {
                warn!(conv_id = conversation_id, error = ?e, "Failed to load conversation");
                self.fail(e.to_string(), Some(RetryAction::Select(conversation_id)));
            }
        }
    }

    fn on_created(&mut self, local_id: u64, session: u64, result: StoreResult<ConversationSummary>) {
        let conversation = match result {
            Ok(conversation) => conversation,
            Err(e) => {
                warn!(error = ?e, "Failed to create conversation");
                self.sending = false;
                self.return_to_draft(local_id, SendTarget::Fresh(session));
                self.fail(e.to_string(), Some(RetryAction::Send));
                self.pump_outbox();
                return;
            }
        };

        let conversation_id = conversation.id;
        info!(conv_id = conversation_id, "Created conversation");
        if !self.state.conversations.iter().any(|c| c.id == conversation_id) {
            self.state.conversations.push(conversation);
        }
        self.list_generation += 1;
        if self.state.shows(SendTarget::Fresh(session)) {
            self.state.active_conversation_id = Some(conversation_id);
        }
        for pending in &mut self.state.outbox {
            if pending.target == SendTarget::Fresh(session) {
                pending.target = SendTarget::Conversation(conversation_id);
            }
        }

        let Some(content) = self.outgoing_content(local_id) else {
            self.sending = false;
            self.pump_outbox();
            return;
        };
        self.start_append(local_id, conversation_id, content, true);
    }

    fn on_appended(
        &mut self,
        local_id: u64,
        conversation_id: i64,
        created: bool,
        result: StoreResult<Message>,
    ) {
        self.sending = false;

        let message = match result {
            Ok(message) => message,
            Err(e) => {
                warn!(conv_id = conversation_id, error = ?e, "Failed to send message");
                self.return_to_draft(local_id, SendTarget::Conversation(conversation_id));
                self.fail(e.to_string(), Some(RetryAction::Send));
                self.pump_outbox();
                return;
            }
        };

        let sent = self
            .take_outgoing(local_id)
            .map(|pending| pending.content)
            .unwrap_or_else(|| message.content.clone());
        info!(conv_id = conversation_id, role = %message.role, "Message sent");
        // The store is reachable again; an older error is stale.
        if self.state.status.is_error() {
            self.state.status = Status::Idle;
        }

        let active = self.state.active_conversation_id == Some(conversation_id);
        let wants_reply = message.role == Role::User;
        if active {
            let mut arrived = Vec::with_capacity(2);
            if message.role == Role::Assistant {
                // The store answered with its reply; keep the user's turn locally.
                arrived.push(Message::transient(Role::User, sent, Some(conversation_id)));
            }
            arrived.push(message.clone());

            if created {
                self.state.messages = arrived;
            } else {
                self.state.messages.extend(arrived);
            }
        }

        if wants_reply {
            let history = if active {
                self.state.messages.clone()
            } else {
                vec![message]
            };
            self.request_reply(conversation_id, history);
        }
        self.pump_outbox();
    }

    fn on_reply(&mut self, conversation_id: i64, result: anyhow::Result<Option<Message>>) {
        match result {
            Ok(Some(reply)) => {
                if self.state.active_conversation_id == Some(conversation_id) {
                    debug!(conv_id = conversation_id, "Reply received");
                    self.state.messages.push(reply);
                } else {
                    debug!(conv_id = conversation_id, "Dropping reply for inactive conversation");
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(conv_id = conversation_id, error = ?e, "Failed to generate reply");
                self.fail(format!("Failed to generate reply: {e}"), None);
            }
        }
    }

    fn on_renamed(&mut self, conversation_id: i64, result: StoreResult<ConversationSummary>) {
        match result {
            Ok(updated) => {
                info!(conv_id = conversation_id, "Renamed conversation");
                self.list_generation += 1;
                if let Some(entry) = self
                    .state
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == updated.id)
                {
                    *entry = updated;
                }
            }
            Err(e) => {
                warn!(conv_id = conversation_id, error = ?e, "Failed to rename conversation");
                self.fail(e.to_string(), None);
            }
        }
    }

    /// Start the oldest queued send unless one is already in flight.
    fn pump_outbox(&mut self) {
        if self.sending {
            return;
        }
        let Some(next) = self
            .state
            .outbox
            .iter_mut()
            .find(|pending| pending.state == OutgoingState::Queued)
        else {
            return;
        };

        next.state = OutgoingState::Sending;
        let local_id = next.local_id;
        let content = next.content.clone();
        let target = next.target;
        self.sending = true;

        match target {
            SendTarget::Conversation(conversation_id) => {
                self.start_append(local_id, conversation_id, content, false);
            }
            SendTarget::Fresh(session) => {
                debug!(local_id, "Creating conversation for first message");
                let request = self.store.create_conversation(None);
                self.spawn(request, move |result| OutcomeKind::Created {
                    local_id,
                    session,
                    result,
                });
            }
        }
    }

    fn start_append(&mut self, local_id: u64, conversation_id: i64, content: String, created: bool) {
        debug!(conv_id = conversation_id, local_id, "Appending message");
        let request = self
            .store
            .append_message(conversation_id, NewMessage::user(content));
        self.spawn(request, move |result| OutcomeKind::Appended {
            local_id,
            conversation_id,
            created,
            result,
        });
    }

    fn request_reply(&mut self, conversation_id: i64, history: Vec<Message>) {
        let Some(replies) = self.replies.clone() else {
            return;
        };
        let request = replies.generate(conversation_id, history);
        self.spawn(request, move |result| OutcomeKind::Reply {
            conversation_id,
            result,
        });
    }

    /// Take a listing from the store while keeping entries changed locally
    /// after it was requested: local titles win and local-only entries stay.
    fn merge_conversations(&mut self, listed: Vec<ConversationSummary>) {
        let mut local = std::mem::take(&mut self.state.conversations);
        let mut merged: Vec<ConversationSummary> = listed
            .into_iter()
            .map(|entry| match local.iter().position(|c| c.id == entry.id) {
                Some(index) => local.remove(index),
                None => entry,
            })
            .collect();
        merged.append(&mut local);
        self.state.conversations = merged;
    }

    fn outgoing_content(&self, local_id: u64) -> Option<String> {
        self.state
            .outbox
            .iter()
            .find(|pending| pending.local_id == local_id)
            .map(|pending| pending.content.clone())
    }

    fn take_outgoing(&mut self, local_id: u64) -> Option<OutgoingMessage> {
        let index = self
            .state
            .outbox
            .iter()
            .position(|pending| pending.local_id == local_id)?;
        Some(self.state.outbox.remove(index))
    }

    /// Move a failed send, and everything queued behind it for the same
    /// target, back into the draft ahead of whatever was typed since.
    fn return_to_draft(&mut self, local_id: u64, target: SendTarget) {
        let mut restored: Vec<String> = self
            .take_outgoing(local_id)
            .map(|pending| pending.content)
            .into_iter()
            .collect();
        let (queued, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.outbox)
            .into_iter()
            .partition(|pending| {
                pending.target == target && pending.state == OutgoingState::Queued
            });
        self.state.outbox = keep;
        restored.extend(queued.into_iter().map(|pending| pending.content));

        if restored.is_empty() {
            return;
        }
        let mut text = restored.join("\n\n");
        if !self.state.draft.trim().is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.state.draft);
        }
        self.state.draft = text;
    }

    fn fail(&mut self, message: String, retry: Option<RetryAction>) {
        self.state.status = Status::Error { message, retry };
    }

    fn clear_loading(&mut self) {
        if matches!(self.state.status, Status::Loading(_)) {
            self.state.status = Status::Idle;
        }
    }

    fn spawn<T, F, W>(&mut self, request: F, wrap: W)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        W: FnOnce(T) -> OutcomeKind + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let value = request.await;
            // The receiver lives as long as the controller.
            let _ = tx.send(Outcome(wrap(value)));
        });
    }
}
