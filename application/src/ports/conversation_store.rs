//! Conversation persistence port.
//!
//! The gateway does not own conversations. It appends messages to, and
//! reads history from, a collaborator that implements
//! [`ConversationStore`]. The store is assumed strongly consistent: a write
//! is visible to the very next read, and each `append_message` is atomic.
//!
//! The store is also where turns are serialized. [`ConversationStore::begin_turn`]
//! hands out the per-conversation write lock; at most one assistant turn per
//! conversation is in flight while the returned guard is held.

use async_trait::async_trait;
use chatrelay_domain::{ChatMessage, Conversation, ConversationId, Role, StoredMessage};
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

/// Errors reported by the persistence collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Storage failure: {0}")]
    Backend(String),
}

/// Exclusive right to run one turn on a conversation.
///
/// Released when dropped.
pub type TurnGuard = OwnedMutexGuard<()>;

/// A message to append, before the store assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub model: Option<String>,
    pub tokens: Option<u32>,
}

impl NewMessage {
    pub fn user(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            model: Some(model.into()),
            tokens: None,
        }
    }

    pub fn assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            model: Some(model.into()),
            tokens: None,
        }
    }

    pub fn with_tokens(mut self, tokens: Option<u32>) -> Self {
        self.tokens = tokens;
        self
    }
}

/// Persistence collaborator for conversation history.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create an empty conversation bound to `model`.
    async fn create_conversation(
        &self,
        title: Option<String>,
        model: &str,
    ) -> Result<Conversation, StoreError>;

    /// Snapshot of a conversation and all its messages.
    async fn get_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<Conversation, StoreError>;

    /// Acquire the per-conversation turn lock, waiting for any turn in progress.
    async fn begin_turn(&self, conversation: &ConversationId) -> Result<TurnGuard, StoreError>;

    /// Append one message at the end of the conversation.
    async fn append_message(
        &self,
        conversation: &ConversationId,
        message: NewMessage,
    ) -> Result<StoredMessage, StoreError>;

    /// Full history in insertion order.
    async fn load_history(
        &self,
        conversation: &ConversationId,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// Update the conversation's last-modified marker.
    async fn touch_conversation(&self, conversation: &ConversationId) -> Result<(), StoreError>;
}
