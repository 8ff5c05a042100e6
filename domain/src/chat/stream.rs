//! Events pushed to the client during a streaming exchange.
//!
//! [`StreamEvent`] is the tagged union relayed over server-sent events. On
//! the wire each event is one JSON object with exactly one of these shapes:
//!
//! ```text
//! {"content": "<fragment>"}
//! {"done": true}
//! {"error": "<caller-safe message>"}
//! ```
//!
//! Any number of `content` events (including zero) precede exactly one
//! terminal `done` or `error`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One event in a streamed assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A fragment of generated text.
    Content(String),
    /// The reply finished and was persisted.
    Done,
    /// The exchange failed; the payload is safe to show to end users.
    Error(String),
}

impl StreamEvent {
    pub fn content(fragment: impl Into<String>) -> Self {
        StreamEvent::Content(fragment.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error(message.into())
    }

    /// Returns the fragment if this is a `Content` event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Content(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the message if this is an `Error` event.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            StreamEvent::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error(_))
    }

    /// Encode as the JSON payload of one SSE `data:` line.
    pub fn to_json(&self) -> String {
        match self {
            StreamEvent::Content(s) => serde_json::json!({ "content": s }).to_string(),
            StreamEvent::Done => serde_json::json!({ "done": true }).to_string(),
            StreamEvent::Error(e) => serde_json::json!({ "error": e }).to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Serialize for StreamEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            StreamEvent::Content(s) => WireEvent {
                content: Some(s.clone()),
                done: None,
                error: None,
            },
            StreamEvent::Done => WireEvent {
                content: None,
                done: Some(true),
                error: None,
            },
            StreamEvent::Error(e) => WireEvent {
                content: None,
                done: None,
                error: Some(e.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StreamEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireEvent::deserialize(deserializer)?;
        // error wins over done, done wins over content
        if let Some(error) = wire.error {
            return Ok(StreamEvent::Error(error));
        }
        if wire.done == Some(true) {
            return Ok(StreamEvent::Done);
        }
        match wire.content {
            Some(content) => Ok(StreamEvent::Content(content)),
            None => Err(D::Error::custom(
                "stream event needs one of `content`, `done` or `error`",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_event_wire_shape() {
        let event = StreamEvent::content("Hel");
        assert_eq!(event.to_json(), r#"{"content":"Hel"}"#);
        assert_eq!(serde_json::to_string(&event).unwrap(), r#"{"content":"Hel"}"#);
        assert_eq!(event.text(), Some("Hel"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn terminal_event_wire_shapes() {
        assert_eq!(StreamEvent::Done.to_json(), r#"{"done":true}"#);
        assert_eq!(
            StreamEvent::error("upstream failed").to_json(),
            r#"{"error":"upstream failed"}"#
        );
        assert!(StreamEvent::Done.is_terminal());
        assert!(StreamEvent::error("x").is_terminal());
    }

    #[test]
    fn parses_wire_events() {
        let done: StreamEvent = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert_eq!(done, StreamEvent::Done);

        let error: StreamEvent = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(error, StreamEvent::error("boom"));

        let content: StreamEvent = serde_json::from_str(r#"{"content":" world"}"#).unwrap();
        assert_eq!(content, StreamEvent::content(" world"));
    }

    #[test]
    fn empty_content_fragment_is_preserved() {
        let content: StreamEvent = serde_json::from_str(r#"{"content":""}"#).unwrap();
        assert_eq!(content, StreamEvent::content(""));
    }

    #[test]
    fn rejects_shapeless_event() {
        assert!(serde_json::from_str::<StreamEvent>(r#"{"done":false}"#).is_err());
        assert!(serde_json::from_str::<StreamEvent>("{}").is_err());
    }
}
