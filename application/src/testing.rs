//! Test doubles shared by the use case tests.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::conversation_store::{ConversationStore, NewMessage, StoreError, TurnGuard};
use crate::ports::provider::{ChatError, FragmentStream, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use chatrelay_domain::{
    ChatMessage, ChatResponse, Conversation, ConversationId, MessageId, ProviderCredential,
    ProviderCredentials, ProviderKind, StoredMessage, Usage,
};
use chrono::Utc;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// -- Stub ProviderAdapter ------------------------------------------------------

/// Scripted adapter: calls are counted, streams replay `fragments` and then
/// optionally fail.
pub struct StubAdapter {
    pub kind: ProviderKind,
    pub reply: String,
    pub usage: Option<Usage>,
    pub fragments: Vec<String>,
    pub fail_with: Option<String>,
    pub delay: Option<Duration>,
    pub once_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
}

impl StubAdapter {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            reply: "stub reply".to_string(),
            usage: None,
            fragments: Vec::new(),
            fail_with: None,
            delay: None,
            once_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_reply(mut self, reply: &str, usage: Option<Usage>) -> Self {
        self.reply = reply.to_string();
        self.usage = usage;
        self
    }

    pub fn with_fragments(mut self, fragments: &[&str]) -> Self {
        self.fragments = fragments.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Fail single-shot calls, and end streams with an error after the fragments.
    pub fn failing_with(mut self, cause: &str) -> Self {
        self.fail_with = Some(cause.to_string());
        self
    }

    /// Sleep before the reply, and before every fragment.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.once_calls.load(Ordering::SeqCst) + self.stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for StubAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn supports_streaming(&self, _model_id: &str) -> bool {
        self.kind != ProviderKind::Google
    }

    async fn chat_once(
        &self,
        _history: &[ChatMessage],
        model_id: &str,
    ) -> Result<ChatResponse, ChatError> {
        self.once_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(ref cause) = self.fail_with {
            return Err(ProviderError::new(self.kind, cause.clone()).into());
        }
        let mut response = ChatResponse::new(self.reply.clone(), model_id);
        response.usage = self.usage;
        Ok(response)
    }

    async fn chat_stream(
        &self,
        _history: &[ChatMessage],
        model_id: &str,
    ) -> Result<FragmentStream, ChatError> {
        if !self.supports_streaming(model_id) {
            return Err(ChatError::streaming_unsupported(model_id));
        }
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let mut items: Vec<Result<String, ProviderError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        if let Some(ref cause) = self.fail_with {
            items.push(Err(ProviderError::new(self.kind, cause.clone())));
        }
        let delay = self.delay;
        let stream = futures::stream::iter(items).then(move |item| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            item
        });
        Ok(Box::pin(stream))
    }
}

pub fn credentials(kinds: &[ProviderKind]) -> ProviderCredentials {
    ProviderCredentials::from_entries(kinds.iter().map(|k| {
        (
            *k,
            ProviderCredential {
                api_key: "test-key".to_string(),
                base_url: "https://example.test".to_string(),
            },
        )
    }))
}

// -- In-memory ConversationStore ----------------------------------------------

/// Minimal store with a write log, so tests can assert on write order.
#[derive(Default)]
pub struct RecordingStore {
    conversations: Mutex<HashMap<ConversationId, Conversation>>,
    locks: Mutex<HashMap<ConversationId, Arc<tokio::sync::Mutex<()>>>>,
    /// `(conversation, role, content)` in the order writes happened.
    pub writes: Mutex<Vec<(String, String, String)>>,
    pub fail_appends_for: Mutex<Option<chatrelay_domain::Role>>,
    pub fail_touch: AtomicBool,
    pub fail_begin_turn: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversation(self, id: &str, model: &str) -> Self {
        let conversation = Conversation::new(ConversationId::new(id), None, model);
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), conversation);
        self
    }

    pub fn fail_appends_for(&self, role: chatrelay_domain::Role) {
        *self.fail_appends_for.lock().unwrap() = Some(role);
    }

    pub fn fail_touch(&self) {
        self.fail_touch.store(true, Ordering::SeqCst);
    }

    pub fn fail_begin_turn(&self) {
        self.fail_begin_turn.store(true, Ordering::SeqCst);
    }

    pub fn messages(&self, id: &str) -> Vec<StoredMessage> {
        self.conversations
            .lock()
            .unwrap()
            .get(&ConversationId::new(id))
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    pub fn write_log(&self) -> Vec<(String, String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationStore for RecordingStore {
    async fn create_conversation(
        &self,
        title: Option<String>,
        model: &str,
    ) -> Result<Conversation, StoreError> {
        let conversation = Conversation::new(ConversationId::generate(), title, model);
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation, StoreError> {
        self.conversations
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ConversationNotFound(id.clone()))
    }

    async fn begin_turn(&self, id: &ConversationId) -> Result<TurnGuard, StoreError> {
        if !self.conversations.lock().unwrap().contains_key(id) {
            return Err(StoreError::ConversationNotFound(id.clone()));
        }
        if self.fail_begin_turn.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("lock table at 10.0.0.7 unreachable".to_string()));
        }
        let lock = self
            .locks
            .lock()
            .unwrap()
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
        if *self.fail_appends_for.lock().unwrap() == Some(message.role) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.clone()))?;
        let stored = StoredMessage {
            id: MessageId::generate(),
            role: message.role,
            content: message.content,
            model: message.model,
            tokens: message.tokens,
            timestamp: Utc::now(),
        };
        conversation.messages.push(stored.clone());
        self.writes.lock().unwrap().push((
            id.to_string(),
            stored.role.to_string(),
            stored.content.clone(),
        ));
        Ok(stored)
    }

    async fn load_history(&self, id: &ConversationId) -> Result<Vec<ChatMessage>, StoreError> {
        let conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .get(id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.clone()))?;
        Ok(conversation
            .messages
            .iter()
            .map(StoredMessage::to_chat_message)
            .collect())
    }

    async fn touch_conversation(&self, id: &ConversationId) -> Result<(), StoreError> {
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("index update failed".to_string()));
        }
        let mut conversations = self.conversations.lock().unwrap();
        conversations
            .get_mut(id)
            .map(Conversation::touch)
            .ok_or_else(|| StoreError::ConversationNotFound(id.clone()))
    }
}

// -- Capturing ConversationLogger ---------------------------------------------

#[derive(Default)]
pub struct CapturingLogger {
    pub events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl CapturingLogger {
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }
}

impl ConversationLogger for CapturingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type.to_string(), event.payload));
    }
}
