//! Decoding of the `data: <json>\n\n` frames of a streamed reply.

use chatrelay_domain::StreamEvent;
use eventsource_stream::Eventsource;
use std::fmt::Display;
use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tracing::{trace, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Stream read failed: {0}")]
    Transport(String),

    #[error("Malformed stream event: {0}")]
    Malformed(String),
}

/// Turn a response body into [`StreamEvent`]s.
///
/// Chunks may end anywhere, including inside a UTF-8 sequence. Keep-alive
/// comments are skipped. A frame that does not parse yields
/// [`FrameError::Malformed`] and decoding carries on.
pub fn stream_events<S, B, E>(body: S) -> impl Stream<Item = Result<StreamEvent, FrameError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    body.eventsource().filter_map(|event| match event {
        Ok(event) if event.data.trim().is_empty() => None,
        Ok(event) => {
            trace!(data = %event.data, "Stream frame");
            Some(serde_json::from_str::<StreamEvent>(&event.data).map_err(|e| {
                warn!(error = %e, "Malformed stream frame");
                FrameError::Malformed(event.data)
            }))
        }
        Err(e) => Some(Err(FrameError::Transport(e.to_string()))),
    })
}
