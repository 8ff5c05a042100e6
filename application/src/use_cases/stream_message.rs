//! Streaming exchange use case.
//!
//! A [`StreamingSession`] drives one streaming exchange through
//! `opening -> streaming -> finalizing -> closed`, with `errored` reachable
//! from every non-terminal state. It writes [`StreamEvent`]s into a bounded
//! channel that the presentation layer relays to the client.
//!
//! Ordering guarantees:
//!
//! - the user message is durably stored before any fragment is forwarded
//! - fragments are forwarded in the order the vendor produced them
//! - the assistant message is stored before `done` is sent
//! - every session ends with exactly one `done` or one `error`, unless the
//!   client went away first
//!
//! A partial reply is never persisted. The session holds the
//! conversation's turn lock until the reply is stored or the exchange
//! fails, so a second exchange on the same conversation waits for it.
//! Every send to the client is bounded by the stream deadline, so a
//! stalled reader cannot keep a session alive past the cap.

use crate::config::GatewayLimits;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::conversation_store::{ConversationStore, NewMessage, StoreError};
use crate::ports::provider::ChatError;
use crate::use_cases::chat_router::ChatRouter;
use chatrelay_domain::util::preview;
use chatrelay_domain::{
    ChatMessage, ConversationId, SessionState, StoredMessage, StreamEvent,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

/// Capacity of the event channel between a session and its relay.
pub const EVENT_BUFFER: usize = 32;

const TIMED_OUT: &str = "response timed out";
const STORAGE_FAILED: &str = "Failed to save the conversation. Please try again.";

/// Input for one streaming exchange.
#[derive(Debug, Clone)]
pub struct StreamMessageInput {
    pub conversation: ConversationId,
    pub content: String,
    pub model: String,
}

impl StreamMessageInput {
    pub fn new(
        conversation: ConversationId,
        content: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            conversation,
            content: content.into(),
            model: model.into(),
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub state: SessionState,
    /// Fragments forwarded to the client.
    pub fragments: usize,
    /// The stored assistant message, present only when the session closed.
    pub persisted: Option<StoredMessage>,
}

/// Reason a session stopped early. Internal to the state machine.
enum Abort {
    /// Tell the client, then stop.
    Notify { stage: &'static str, cause: String, message: String },
    /// The client is gone; nobody to tell.
    Disconnected,
}

impl Abort {
    fn notify(stage: &'static str, cause: impl ToString, message: impl Into<String>) -> Self {
        Abort::Notify {
            stage,
            cause: cause.to_string(),
            message: message.into(),
        }
    }
}

/// One streaming exchange. Consumed by [`StreamingSession::run`].
pub struct StreamingSession {
    router: Arc<ChatRouter>,
    store: Arc<dyn ConversationStore>,
    conversation_logger: Arc<dyn ConversationLogger>,
    limits: GatewayLimits,
    state: SessionState,
    fragments: usize,
    deadline: Option<Instant>,
}

impl StreamingSession {
    pub fn new(router: Arc<ChatRouter>, store: Arc<dyn ConversationStore>) -> Self {
        let limits = router.limits();
        Self {
            router,
            store,
            conversation_logger: Arc::new(NoConversationLogger),
            limits,
            state: SessionState::Opening,
            fragments: 0,
            deadline: None,
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn advance(&mut self, next: SessionState) {
        match self.state.transition(next) {
            Ok(state) => self.state = state,
            // Only reachable through a bug in this module.
            Err(e) => warn!("{}", e),
        }
    }

    /// Run the exchange to completion, writing events into `events`.
    ///
    /// Returns once the session is terminal. The sender is dropped on
    /// return, which ends the client's stream.
    pub async fn run(
        mut self,
        input: StreamMessageInput,
        events: mpsc::Sender<StreamEvent>,
    ) -> SessionOutcome {
        info!(
            conversation = %input.conversation,
            model = %input.model,
            "Opening stream: {}",
            preview(&input.content, 100)
        );

        match self.drive(&input, &events).await {
            Ok(persisted) => {
                self.conversation_logger.log(ConversationEvent::new(
                    "stream_completed",
                    serde_json::json!({
                        "conversation": input.conversation.as_str(),
                        "model": input.model,
                        "fragments": self.fragments,
                        "bytes": persisted.content.len(),
                    }),
                ));
                info!(
                    conversation = %input.conversation,
                    fragments = self.fragments,
                    "Stream closed"
                );
                SessionOutcome {
                    state: self.state,
                    fragments: self.fragments,
                    persisted: Some(persisted),
                }
            }
            Err(abort) => {
                let failed_in = self.state;
                self.advance(SessionState::Errored);
                let (stage, cause) = match abort {
                    Abort::Notify {
                        stage,
                        cause,
                        message,
                    } => {
                        // Best effort; the client may already be gone.
                        let deadline = self
                            .deadline
                            .unwrap_or_else(|| Instant::now() + self.limits.stream_timeout);
                        if !matches!(
                            timeout_at(deadline, events.send(StreamEvent::error(message))).await,
                            Ok(Ok(()))
                        ) {
                            debug!(conversation = %input.conversation, "Error event not delivered");
                        }
                        (stage, cause)
                    }
                    Abort::Disconnected => ("relay", "client disconnected".to_string()),
                };
                warn!(
                    conversation = %input.conversation,
                    state = %failed_in,
                    stage,
                    error = %cause,
                    "Stream failed"
                );
                self.conversation_logger.log(ConversationEvent::new(
                    "stream_failed",
                    serde_json::json!({
                        "conversation": input.conversation.as_str(),
                        "model": input.model,
                        "stage": stage,
                        "fragments": self.fragments,
                        "error": cause,
                    }),
                ));
                SessionOutcome {
                    state: self.state,
                    fragments: self.fragments,
                    persisted: None,
                }
            }
        }
    }

    async fn drive(
        &mut self,
        input: &StreamMessageInput,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<StoredMessage, Abort> {
        let conversation = &input.conversation;

        // -- opening ----------------------------------------------------------
        ChatMessage::try_user(input.content.as_str())
            .map_err(|e| Abort::notify("validate", &e, e.to_string()))?;
        self.router
            .preflight_stream(&input.model)
            .map_err(|e| Abort::notify("route", &e, e.user_message()))?;

        let turn = self
            .store
            .begin_turn(conversation)
            .await
            .map_err(|e| {
                let message = match e {
                    StoreError::ConversationNotFound(_) => e.to_string(),
                    StoreError::Backend(_) => STORAGE_FAILED.to_string(),
                };
                Abort::notify("lock", &e, message)
            })?;

        self.store
            .append_message(
                conversation,
                NewMessage::user(input.content.as_str(), input.model.as_str()),
            )
            .await
            .map_err(|e| Abort::notify("persist_user", &e, STORAGE_FAILED))?;

        let history = self
            .store
            .load_history(conversation)
            .await
            .map_err(|e| Abort::notify("load_history", &e, STORAGE_FAILED))?;

        // -- streaming --------------------------------------------------------
        self.advance(SessionState::Streaming);
        let deadline = Instant::now() + self.limits.stream_timeout;
        self.deadline = Some(deadline);

        let mut upstream = match timeout_at(
            deadline,
            self.router.chat_stream(&history, &input.model),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(Abort::notify("open", &e, e.user_message())),
            Err(_) => return Err(Abort::notify("open", TIMED_OUT, TIMED_OUT)),
        };

        let mut reply = String::new();
        loop {
            let fragment = match timeout_at(deadline, upstream.next()).await {
                Ok(Some(Ok(fragment))) => fragment,
                Ok(Some(Err(e))) => {
                    let message = ChatError::from(e.clone()).user_message();
                    return Err(Abort::notify("upstream", &e, message));
                }
                Ok(None) => break,
                Err(_) => return Err(Abort::notify("upstream", TIMED_OUT, TIMED_OUT)),
            };

            reply.push_str(&fragment);
            match timeout_at(deadline, events.send(StreamEvent::content(fragment))).await {
                Ok(Ok(())) => self.fragments += 1,
                Ok(Err(_)) => return Err(Abort::Disconnected),
                Err(_) => return Err(Abort::notify("relay", TIMED_OUT, TIMED_OUT)),
            }
        }
        drop(upstream);
        debug!(
            conversation = %conversation,
            fragments = self.fragments,
            bytes = reply.len(),
            "Upstream finished"
        );

        // -- finalizing -------------------------------------------------------
        self.advance(SessionState::Finalizing);
        let persisted = self
            .store
            .append_message(
                conversation,
                NewMessage::assistant(reply, input.model.as_str()),
            )
            .await
            .map_err(|e| Abort::notify("persist_assistant", &e, STORAGE_FAILED))?;

        if let Err(e) = self.store.touch_conversation(conversation).await {
            warn!(conversation = %conversation, error = %e, "Failed to touch conversation");
        }
        drop(turn);

        // The reply is stored either way; a vanished or stalled client only
        // misses `done`.
        if !matches!(
            timeout_at(deadline, events.send(StreamEvent::Done)).await,
            Ok(Ok(()))
        ) {
            debug!(conversation = %conversation, "Done not delivered");
        }
        self.advance(SessionState::Closed);
        Ok(persisted)
    }
}

/// Factory for streaming sessions, shared by request handlers.
#[derive(Clone)]
pub struct StreamMessageUseCase {
    router: Arc<ChatRouter>,
    store: Arc<dyn ConversationStore>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl StreamMessageUseCase {
    pub fn new(router: Arc<ChatRouter>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            router,
            store,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn router(&self) -> &ChatRouter {
        &self.router
    }

    pub fn session(&self) -> StreamingSession {
        StreamingSession::new(self.router.clone(), self.store.clone())
            .with_conversation_logger(self.conversation_logger.clone())
    }

    /// Run a fresh session on its own task.
    ///
    /// The receiver yields the session's events and ends when the session
    /// does. Dropping the receiver cancels the exchange at the next fragment.
    pub fn spawn(
        &self,
        input: StreamMessageInput,
    ) -> (mpsc::Receiver<StreamEvent>, JoinHandle<SessionOutcome>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let session = self.session();
        let handle = tokio::spawn(session.run(input, tx));
        (rx, handle)
    }
}
