use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::conversation_store::{BoxFuture, ConversationStore, StoreOperation};
use super::error::{StoreError, StoreResult};
use crate::models::{Conversation, ConversationSummary, Message, NewConversation, NewMessage};

/// Where a conversation's messages are read from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagesEndpoint {
    /// `GET /conversations/{id}/messages` returning an array of messages.
    #[default]
    Nested,
    /// `GET /conversations/{id}` returning the conversation with `.messages`.
    Embedded,
}

/// Store client speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpConversationStore {
    client: reqwest::Client,
    base_url: String,
    messages_endpoint: MessagesEndpoint,
}

impl HttpConversationStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("dstl-chat/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            messages_endpoint: MessagesEndpoint::default(),
        })
    }

    pub fn with_messages_endpoint(mut self, endpoint: MessagesEndpoint) -> Self {
        self.messages_endpoint = endpoint;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: String,
        operation: StoreOperation,
    ) -> StoreResult<T> {
        debug!(path = %path, %operation, "GET");
        let response = self
            .client
            .get(self.url(&path))
            .send()
            .await
            .map_err(|source| StoreError::Network { operation, source })?;
        read_json(response, operation).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: String,
        body: &B,
        operation: StoreOperation,
    ) -> StoreResult<T> {
        debug!(path = %path, %method, %operation, "sending request");
        let response = self
            .client
            .request(method, self.url(&path))
            .json(body)
            .send()
            .await
            .map_err(|source| StoreError::Network { operation, source })?;
        read_json(response, operation).await
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: StoreOperation,
) -> StoreResult<T> {
    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), %operation, "store returned non-success status");
        return Err(StoreError::Fetch {
            operation,
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| StoreError::Network { operation, source })?;

    serde_json::from_slice(&body).map_err(|source| StoreError::Parse { operation, source })
}

/// Body of `PUT /conversations/{id}`.
#[derive(Serialize)]
struct ConversationUpdate<'a> {
    id: i64,
    title: Option<&'a str>,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize)]
struct ConversationWithMessages {
    #[serde(default)]
    messages: Vec<Message>,
}

impl ConversationStore for HttpConversationStore {
    fn list_conversations(&self) -> BoxFuture<'static, StoreResult<Vec<ConversationSummary>>> {
        let store = self.clone();

        Box::pin(async move {
            store
                .get_json("/conversations/".to_string(), StoreOperation::ListConversations)
                .await
        })
    }

    fn get_messages(&self, conversation_id: i64) -> BoxFuture<'static, StoreResult<Vec<Message>>> {
        let store = self.clone();

        Box::pin(async move {
            match store.messages_endpoint {
                MessagesEndpoint::Nested => {
                    store
                        .get_json(
                            format!("/conversations/{conversation_id}/messages"),
                            StoreOperation::GetMessages,
                        )
                        .await
                }
                MessagesEndpoint::Embedded => {
                    let conversation: ConversationWithMessages = store
                        .get_json(
                            format!("/conversations/{conversation_id}"),
                            StoreOperation::GetMessages,
                        )
                        .await?;
                    Ok(conversation.messages)
                }
            }
        })
    }

    fn create_conversation(
        &self,
        title: Option<String>,
    ) -> BoxFuture<'static, StoreResult<ConversationSummary>> {
        let store = self.clone();

        Box::pin(async move {
            let conversation: Conversation = store
                .send_json(
                    reqwest::Method::POST,
                    "/conversations/".to_string(),
                    &NewConversation { title },
                    StoreOperation::CreateConversation,
                )
                .await?;
            Ok(conversation.into())
        })
    }

    fn update_conversation(
        &self,
        conversation: ConversationSummary,
    ) -> BoxFuture<'static, StoreResult<ConversationSummary>> {
        let store = self.clone();

        Box::pin(async move {
            let body = ConversationUpdate {
                id: conversation.id,
                title: conversation.title.as_deref(),
                created_at: conversation.created_at,
            };
            let updated: Conversation = store
                .send_json(
                    reqwest::Method::PUT,
                    format!("/conversations/{}", conversation.id),
                    &body,
                    StoreOperation::UpdateConversation,
                )
                .await?;
            Ok(updated.into())
        })
    }

    fn append_message(
        &self,
        conversation_id: i64,
        message: NewMessage,
    ) -> BoxFuture<'static, StoreResult<Message>> {
        let store = self.clone();

        Box::pin(async move {
            store
                .send_json(
                    reqwest::Method::POST,
                    format!("/conversations/{conversation_id}/messages"),
                    &message,
                    StoreOperation::AppendMessage,
                )
                .await
        })
    }
}
