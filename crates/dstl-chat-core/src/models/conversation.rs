use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::message::Message;
use super::timestamp;

/// A conversation as returned by the store, optionally with its messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }
}

/// Lightweight conversation metadata used for the sidebar.
/// Loaded without the message history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl ConversationSummary {
    /// Title shown in the sidebar; untitled conversations fall back to their id.
    pub fn display_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Conversation {}", self.id),
        }
    }

    /// Creation date in the local calendar.
    pub fn display_date(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d")
            .to_string()
    }
}

impl From<Conversation> for ConversationSummary {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id,
            title: conversation.title,
            created_at: conversation.created_at,
        }
    }
}

/// Request body for creating a conversation. `title` is sent as-is, `null` included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversation {
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(title: Option<&str>) -> ConversationSummary {
        ConversationSummary {
            id: 42,
            title: title.map(String::from),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_untitled_conversation_falls_back_to_id() {
        assert_eq!(summary(None).display_title(), "Conversation 42");
        assert_eq!(summary(Some("   ")).display_title(), "Conversation 42");
        assert_eq!(summary(Some("Trip plans")).display_title(), "Trip plans");
    }

    #[test]
    fn test_display_date_is_calendar_date() {
        let date = summary(None).display_date();
        assert_eq!(date.len(), 10);
        assert_eq!(date.matches('-').count(), 2);
    }

    #[test]
    fn test_conversation_without_messages_field() {
        let json = r#"{"id": 1, "title": null, "created_at": "2024-05-01T10:00:00"}"#;
        let conversation: Conversation = serde_json::from_str(json).unwrap();
        assert!(conversation.messages.is_empty());
        assert_eq!(conversation.summary().display_title(), "Conversation 1");
    }

    #[test]
    fn test_summary_ignores_embedded_messages() {
        let json = r#"{
            "id": 2,
            "title": "Hello",
            "created_at": "2024-05-01T10:00:00",
            "messages": [{"role": "user", "content": "hi"}]
        }"#;
        let summary: ConversationSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.title.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_new_conversation_keeps_null_title() {
        let body = serde_json::to_value(NewConversation { title: None }).unwrap();
        assert_eq!(body, serde_json::json!({"title": null}));
    }
}
