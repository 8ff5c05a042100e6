//! Conversation record (Entity)

use crate::chat::message::StoredMessage;
use crate::core::conversation::ConversationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a conversation is created without one.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// A persisted conversation with its full message list.
///
/// `model` is the model chosen at creation; single-shot turns use it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub model: String,
    pub messages: Vec<StoredMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: ConversationId, title: Option<String>, model: impl Into<String>) -> Self {
        let now = Utc::now();
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        Self {
            id,
            title,
            model: model.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
