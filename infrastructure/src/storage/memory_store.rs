//! In-process conversation store.
//!
//! Keeps every conversation in memory for the life of the process. Writes
//! are atomic per message and visible to the next read. Each conversation
//! has its own turn lock, created on first use.

use async_trait::async_trait;
use chatrelay_application::{ConversationStore, NewMessage, StoreError, TurnGuard};
use chatrelay_domain::{
    ChatMessage, Conversation, ConversationId, MessageId, StoredMessage,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
    turn_locks: Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }

    fn not_found(id: &ConversationId) -> StoreError {
        StoreError::ConversationNotFound(id.clone())
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(
        &self,
        title: Option<String>,
        model: &str,
    ) -> Result<Conversation, StoreError> {
        let conversation = Conversation::new(ConversationId::generate(), title, model);
        debug!(conversation = %conversation.id, model = %model, "Created conversation");
        self.conversations
            .write()
            .await
            .insert(conversation.id.clone(), conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation, StoreError> {
        self.conversations
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn begin_turn(&self, id: &ConversationId) -> Result<TurnGuard, StoreError> {
        if !self.conversations.read().await.contains_key(id) {
            return Err(Self::not_found(id));
        }
        let lock = self
            .turn_locks
            .lock()
            .await
            .entry(id.clone())
            .or_default()
            .clone();
        Ok(lock.lock_owned().await)
    }

    async fn append_message(
        &self,
        id: &ConversationId,
        message: NewMessage,
    ) -> Result<StoredMessage, StoreError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        let stored = StoredMessage {
            id: MessageId::generate(),
            role: message.role,
            content: message.content,
            model: message.model,
            tokens: message.tokens,
            timestamp: Utc::now(),
        };
        conversation.messages.push(stored.clone());
        Ok(stored)
    }

    async fn load_history(&self, id: &ConversationId) -> Result<Vec<ChatMessage>, StoreError> {
        let conversations = self.conversations.read().await;
        let conversation = conversations.get(id).ok_or_else(|| Self::not_found(id))?;
        Ok(conversation
            .messages
            .iter()
            .map(StoredMessage::to_chat_message)
            .collect())
    }

    async fn touch_conversation(&self, id: &ConversationId) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        conversation.touch();
        Ok(())
    }
}
