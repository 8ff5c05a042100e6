//! Client-side view of one conversation while replies stream in.
//!
//! The server is authoritative. The reducer only keeps an optimistic copy
//! so fragments can be shown as they arrive; after a failed stream the
//! caller refetches the conversation and hands it to
//! [`ConversationStateReducer::reconcile`], which drops the partial text.

use chatrelay_domain::{ConversationId, MessageId, Role, StoredMessage, StreamEvent};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStatus {
    Complete,
    InFlight,
    /// Generation failed; the message keeps whatever text arrived.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub status: MessageStatus,
}

impl LocalMessage {
    fn complete(id: MessageId, role: Role, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            status: MessageStatus::Complete,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.status == MessageStatus::InFlight
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConversation {
    pub id: ConversationId,
    pub messages: Vec<LocalMessage>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReducerError {
    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("A reply is still being generated")]
    TurnInFlight,
}

pub struct ConversationStateReducer {
    conversation: LocalConversation,
    in_flight: Option<MessageId>,
}

impl ConversationStateReducer {
    pub fn new(id: ConversationId) -> Self {
        Self {
            conversation: LocalConversation {
                id,
                messages: Vec::new(),
            },
            in_flight: None,
        }
    }

    pub fn from_history(id: ConversationId, history: &[StoredMessage]) -> Self {
        let mut reducer = Self::new(id);
        reducer.reconcile(history);
        reducer
    }

    pub fn conversation(&self) -> &LocalConversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[LocalMessage] {
        &self.conversation.messages
    }

    pub fn in_flight(&self) -> Option<&LocalMessage> {
        let id = self.in_flight?;
        self.conversation.messages.iter().find(|m| m.id == id)
    }

    /// Optimistically append the user's message and an empty assistant
    /// placeholder. Returns the placeholder's id.
    pub fn begin_send(&mut self, content: &str) -> Result<MessageId, ReducerError> {
        if content.trim().is_empty() {
            return Err(ReducerError::EmptyContent);
        }
        if self.in_flight.is_some() {
            return Err(ReducerError::TurnInFlight);
        }

        self.conversation.messages.push(LocalMessage::complete(
            MessageId::generate(),
            Role::User,
            content,
        ));
        let placeholder = MessageId::generate();
        self.conversation.messages.push(LocalMessage {
            id: placeholder,
            role: Role::Assistant,
            content: String::new(),
            status: MessageStatus::InFlight,
        });
        self.in_flight = Some(placeholder);
        Ok(placeholder)
    }

    /// Apply one event from the stream.
    ///
    /// Events that arrive with nothing in flight (a repeated `done`, a
    /// late frame after an error) are ignored.
    pub fn apply(&mut self, event: &StreamEvent) {
        let Some(message) = self.in_flight_mut() else {
            debug!(?event, "Ignoring stream event with no reply in flight");
            return;
        };

        match event {
            StreamEvent::Content(fragment) => message.content.push_str(fragment),
            StreamEvent::Done => {
                message.status = MessageStatus::Complete;
                self.in_flight = None;
            }
            StreamEvent::Error(reason) => {
                message.status = MessageStatus::Failed(reason.clone());
                self.in_flight = None;
            }
        }
    }

    /// The connection dropped before a terminal event arrived.
    pub fn connection_lost(&mut self, reason: &str) {
        if let Some(message) = self.in_flight_mut() {
            message.status = MessageStatus::Failed(reason.to_string());
            self.in_flight = None;
        }
    }

    /// Replace local state with the server's history.
    pub fn reconcile(&mut self, history: &[StoredMessage]) {
        self.conversation.messages = history
            .iter()
            .map(|m| LocalMessage::complete(m.id, m.role, m.content.clone()))
            .collect();
        self.in_flight = None;
    }

    fn in_flight_mut(&mut self) -> Option<&mut LocalMessage> {
        let id = self.in_flight?;
        self.conversation.messages.iter_mut().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stored(role: Role, content: &str) -> StoredMessage {
        StoredMessage {
            id: MessageId::generate(),
            role,
            content: content.to_string(),
            model: None,
            tokens: None,
            timestamp: Utc::now(),
        }
    }

    fn reducer() -> ConversationStateReducer {
        ConversationStateReducer::new(ConversationId::new("c1"))
    }

    #[test]
    fn fragments_append_to_the_placeholder() {
        let mut reducer = reducer();
        let id = reducer.begin_send("Say hello").unwrap();

        for fragment in ["Hel", "lo", " world"] {
            reducer.apply(&StreamEvent::content(fragment));
        }
        assert_eq!(reducer.in_flight().unwrap().content, "Hello world");

        reducer.apply(&StreamEvent::Done);
        let messages = reducer.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].id, id);
        assert_eq!(messages[1].content, "Hello world");
        assert_eq!(messages[1].status, MessageStatus::Complete);
        assert!(reducer.in_flight().is_none());
    }

    #[test]
    fn duplicate_done_is_a_no_op() {
        let mut reducer = reducer();
        reducer.begin_send("hi").unwrap();
        reducer.apply(&StreamEvent::content("Hey"));
        reducer.apply(&StreamEvent::Done);
        let before = reducer.conversation().clone();

        reducer.apply(&StreamEvent::Done);
        reducer.apply(&StreamEvent::content("late"));
        assert_eq!(reducer.conversation(), &before);
    }

    #[test]
    fn error_keeps_partial_text_and_marks_failure() {
        let mut reducer = reducer();
        reducer.begin_send("hi").unwrap();
        reducer.apply(&StreamEvent::content("Hel"));
        reducer.apply(&StreamEvent::error("response timed out"));

        let last = reducer.messages().last().unwrap();
        assert_eq!(last.content, "Hel");
        assert_eq!(
            last.status,
            MessageStatus::Failed("response timed out".to_string())
        );
        assert!(reducer.in_flight().is_none());
    }

    #[test]
    fn connection_loss_fails_the_in_flight_reply() {
        let mut reducer = reducer();
        reducer.begin_send("hi").unwrap();
        reducer.apply(&StreamEvent::content("Par"));
        reducer.connection_lost("network error");

        let last = reducer.messages().last().unwrap();
        assert_eq!(last.content, "Par");
        assert!(matches!(last.status, MessageStatus::Failed(ref r) if r == "network error"));

        // nothing left to fail
        reducer.connection_lost("again");
        let last = reducer.messages().last().unwrap();
        assert!(matches!(last.status, MessageStatus::Failed(ref r) if r == "network error"));
    }

    #[test]
    fn one_turn_at_a_time() {
        let mut reducer = reducer();
        assert_eq!(reducer.begin_send("  "), Err(ReducerError::EmptyContent));
        reducer.begin_send("first").unwrap();
        assert_eq!(reducer.begin_send("second"), Err(ReducerError::TurnInFlight));

        reducer.apply(&StreamEvent::Done);
        assert!(reducer.begin_send("second").is_ok());
        assert_eq!(reducer.messages().len(), 4);
    }

    #[test]
    fn reconcile_discards_failed_partial_reply() {
        let mut reducer = reducer();
        reducer.begin_send("hi").unwrap();
        reducer.apply(&StreamEvent::content("Hel"));
        reducer.apply(&StreamEvent::error("failed"));

        // server only persisted the user turn
        let history = vec![stored(Role::User, "hi")];
        reducer.reconcile(&history);

        assert_eq!(reducer.messages().len(), 1);
        assert_eq!(reducer.messages()[0].id, history[0].id);
        assert_eq!(reducer.messages()[0].status, MessageStatus::Complete);
    }

    #[test]
    fn reconcile_mid_stream_drops_the_placeholder() {
        let history = vec![stored(Role::User, "a"), stored(Role::Assistant, "b")];
        let mut reducer =
            ConversationStateReducer::from_history(ConversationId::new("c1"), &history);
        assert_eq!(reducer.messages().len(), 2);

        reducer.begin_send("c").unwrap();
        reducer.reconcile(&history);
        reducer.apply(&StreamEvent::content("ignored"));
        assert!(reducer.in_flight().is_none());
        assert_eq!(reducer.messages()[1].content, "b");
    }
}
