//! Send Message use case.
//!
//! Single-shot exchange: persist the user turn, ask the conversation's model
//! for a complete reply, persist that reply, and return both.
//!
//! The user message is written before the model is called and stays written
//! if the call fails. The whole turn runs under the conversation's turn
//! lock, so it never interleaves with a streaming exchange on the same
//! conversation.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::conversation_store::{ConversationStore, NewMessage, StoreError};
use crate::ports::provider::ChatError;
use crate::use_cases::chat_router::ChatRouter;
use chatrelay_domain::util::preview;
use chatrelay_domain::{ChatMessage, ConversationId, DomainError, StoredMessage, Usage};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while sending a message.
#[derive(Error, Debug)]
pub enum SendMessageError {
    #[error(transparent)]
    InvalidInput(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

/// Input for the [`SendMessageUseCase`].
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub conversation: ConversationId,
    pub content: String,
}

impl SendMessageInput {
    pub fn new(conversation: ConversationId, content: impl Into<String>) -> Self {
        Self {
            conversation,
            content: content.into(),
        }
    }
}

/// Both persisted messages plus whatever usage the vendor reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageOutput {
    pub user_message: StoredMessage,
    pub assistant_message: StoredMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Clone)]
pub struct SendMessageUseCase {
    router: Arc<ChatRouter>,
    store: Arc<dyn ConversationStore>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl SendMessageUseCase {
    pub fn new(router: Arc<ChatRouter>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            router,
            store,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub async fn execute(
        &self,
        input: SendMessageInput,
    ) -> Result<SendMessageOutput, SendMessageError> {
        let SendMessageInput {
            conversation,
            content,
        } = input;
        ChatMessage::try_user(content.as_str())?;

        let model = self.store.get_conversation(&conversation).await?.model;
        info!(
            conversation = %conversation,
            model = %model,
            "Sending message: {}",
            preview(&content, 100)
        );

        let _turn = self.store.begin_turn(&conversation).await?;

        let user_message = self
            .store
            .append_message(&conversation, NewMessage::user(content, &model))
            .await?;

        let history = self.store.load_history(&conversation).await?;
        debug!("History has {} messages", history.len());

        let response = match self.router.chat(&history, &model).await {
            Ok(response) => response,
            Err(e) => {
                warn!(conversation = %conversation, error = %e, "Chat failed");
                self.conversation_logger.log(ConversationEvent::new(
                    "chat_failed",
                    serde_json::json!({
                        "conversation": conversation.as_str(),
                        "model": model,
                        "error": e.to_string(),
                    }),
                ));
                return Err(e.into());
            }
        };

        let tokens = response.usage.and_then(|u| u.measured_total());
        let assistant_message = self
            .store
            .append_message(
                &conversation,
                NewMessage::assistant(response.content, &model).with_tokens(tokens),
            )
            .await?;
        // Both turns are stored; a stale last-modified marker is not a failure.
        if let Err(e) = self.store.touch_conversation(&conversation).await {
            warn!(conversation = %conversation, error = %e, "Failed to touch conversation");
        }

        self.conversation_logger.log(ConversationEvent::new(
            "chat_completed",
            serde_json::json!({
                "conversation": conversation.as_str(),
                "model": model,
                "bytes": assistant_message.content.len(),
                "tokens": tokens,
            }),
        ));

        Ok(SendMessageOutput {
            user_message,
            assistant_message,
            usage: response.usage,
        })
    }
}
