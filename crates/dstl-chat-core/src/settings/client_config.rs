use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::services::{CannedReply, ReplyGenerator};
use crate::store::{HttpConversationStore, MessagesEndpoint};

/// Environment variable that overrides `base_url` from the config file.
pub const BASE_URL_ENV: &str = "DSTL_CHAT_BASE_URL";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub messages_endpoint: MessagesEndpoint,
    pub reply: ReplySettings,
}

/// Local stand-in for assistant replies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplySettings {
    pub enabled: bool,
    pub text: String,
    pub delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            request_timeout_secs: 30,
            messages_endpoint: MessagesEndpoint::Nested,
            reply: ReplySettings::default(),
        }
    }
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            text: CannedReply::DEFAULT_TEXT.to_string(),
            delay_ms: 1000,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn http_store(&self) -> reqwest::Result<HttpConversationStore> {
        Ok(
            HttpConversationStore::new(&self.base_url, self.request_timeout())?
                .with_messages_endpoint(self.messages_endpoint),
        )
    }

    pub fn reply_generator(&self) -> Option<Arc<dyn ReplyGenerator>> {
        if !self.reply.enabled {
            return None;
        }
        Some(Arc::new(CannedReply::new(
            self.reply.text.clone(),
            Duration::from_millis(self.reply.delay_ms),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_store() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8100");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.reply_generator().is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "http://chat.internal:9000", "reply": {"enabled": true}}"#)
                .unwrap();
        assert_eq!(config.base_url, "http://chat.internal:9000");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.reply.enabled);
        assert_eq!(config.reply.text, CannedReply::DEFAULT_TEXT);
        assert!(config.reply_generator().is_some());
    }

    #[test]
    fn test_messages_endpoint_is_lowercase() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"messages_endpoint": "embedded"}"#).unwrap();
        assert_eq!(config.messages_endpoint, MessagesEndpoint::Embedded);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = ClientConfig {
            request_timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
