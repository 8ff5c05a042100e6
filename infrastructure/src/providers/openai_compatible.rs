//! OpenAI-compatible chat completions adapter.
//!
//! Serves both OpenAI and DeepSeek: the two vendors expose the same
//! `/chat/completions` contract and differ only in base URL and key.
//! Streaming replies arrive as server-sent events whose `data:` payloads are
//! JSON chunks, terminated by a literal `[DONE]`.

use super::http::{ensure_success, transport_error};
use async_trait::async_trait;
use chatrelay_application::{ChatError, FragmentStream, ProviderAdapter, ProviderError};
use chatrelay_domain::{
    ChatMessage, ChatResponse, GenerationParams, ProviderCredential, ProviderKind, Usage,
};
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, future, stream};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{debug, trace, warn};

// ==================== Wire types ====================

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize, Debug, PartialEq)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize, Debug)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    /// Vendors report failures mid-stream as `{"error": {...}}`.
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Debug, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// What one SSE `data:` payload means for the fragment stream.
#[derive(Debug, PartialEq)]
enum ChunkOutcome {
    Fragment(String),
    /// Role-only deltas, keep-alives, empty content.
    Skip,
    Done,
    Failed(ProviderError),
    /// The body ended without `[DONE]`.
    Truncated,
}

fn decode_chunk(kind: ProviderKind, data: &str) -> ChunkOutcome {
    let data = data.trim();
    if data == "[DONE]" {
        return ChunkOutcome::Done;
    }
    if data.is_empty() {
        return ChunkOutcome::Skip;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(StreamChunk {
            error: Some(error), ..
        }) => ChunkOutcome::Failed(ProviderError::new(kind, vendor_error_message(&error))),
        Ok(chunk) => match chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
        {
            Some(content) if !content.is_empty() => ChunkOutcome::Fragment(content),
            _ => ChunkOutcome::Skip,
        },
        Err(e) => ChunkOutcome::Failed(ProviderError::new(
            kind,
            format!("unparseable stream chunk ({}): {}", e, data),
        )),
    }
}

fn vendor_error_message(error: &serde_json::Value) -> String {
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    format!("vendor error mid-stream: {}", message)
}

/// Turn a raw SSE byte stream into text fragments.
///
/// Stops at `[DONE]` and after the first error. A body that ends before
/// `[DONE]` yields a final error, so a cut-off reply never looks complete.
fn fragment_stream<S, B, E>(kind: ProviderKind, bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: Display + Send + 'static,
{
    let stream = bytes
        .eventsource()
        .map(move |event| match event {
            Ok(event) => {
                trace!(event = %event.event, "SSE event");
                decode_chunk(kind, &event.data)
            }
            Err(e) => ChunkOutcome::Failed(ProviderError::new(
                kind,
                format!("stream read failed: {}", e),
            )),
        })
        .chain(stream::once(future::ready(ChunkOutcome::Truncated)))
        .scan(false, move |stopped, outcome| {
            if *stopped {
                return future::ready(None);
            }
            let item = match outcome {
                ChunkOutcome::Done => None,
                ChunkOutcome::Failed(e) => {
                    *stopped = true;
                    Some(Some(Err(e)))
                }
                ChunkOutcome::Truncated => {
                    *stopped = true;
                    Some(Some(Err(ProviderError::new(
                        kind,
                        "stream ended before [DONE]",
                    ))))
                }
                ChunkOutcome::Fragment(text) => Some(Some(Ok(text))),
                ChunkOutcome::Skip => Some(None),
            };
            future::ready(item)
        })
        .filter_map(future::ready);
    Box::pin(stream)
}

// ==================== Adapter ====================

pub struct OpenAiCompatibleAdapter {
    kind: ProviderKind,
    client: Client,
    credential: ProviderCredential,
    params: GenerationParams,
}

impl OpenAiCompatibleAdapter {
    pub fn new(
        kind: ProviderKind,
        client: Client,
        credential: ProviderCredential,
        params: GenerationParams,
    ) -> Self {
        Self {
            kind,
            client,
            credential,
            params,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.credential.base_url.trim_end_matches('/'))
    }

    fn request<'a>(
        &self,
        history: &'a [ChatMessage],
        model_id: &'a str,
        stream: bool,
    ) -> CompletionRequest<'a> {
        CompletionRequest {
            model: model_id,
            messages: history
                .iter()
                .map(|m| WireMessage {
                    role: m.role().as_str(),
                    content: m.content(),
                })
                .collect(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_output_tokens,
            stream,
        }
    }

    async fn post(&self, body: &CompletionRequest<'_>) -> Result<reqwest::Response, ProviderError> {
        debug!(
            provider = %self.kind,
            model = %body.model,
            messages = body.messages.len(),
            stream = body.stream,
            "Calling chat completions"
        );
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.credential.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(self.kind, e))?;
        ensure_success(self.kind, response).await
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn supports_streaming(&self, _model_id: &str) -> bool {
        true
    }

    async fn chat_once(
        &self,
        history: &[ChatMessage],
        model_id: &str,
    ) -> Result<ChatResponse, ChatError> {
        let body = self.request(history, model_id, false);
        let response = self.post(&body).await?;
        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| transport_error(self.kind, e))?;
        into_chat_response(self.kind, completion, model_id).map_err(ChatError::from)
    }

    async fn chat_stream(
        &self,
        history: &[ChatMessage],
        model_id: &str,
    ) -> Result<FragmentStream, ChatError> {
        let body = self.request(history, model_id, true);
        let response = self.post(&body).await?;
        Ok(fragment_stream(self.kind, response.bytes_stream()))
    }
}

fn into_chat_response(
    kind: ProviderKind,
    completion: CompletionResponse,
    model_id: &str,
) -> Result<ChatResponse, ProviderError> {
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            warn!(provider = %kind, "Completion had no content");
            ProviderError::new(kind, "response contained no content")
        })?;

    // Report the id the caller asked for; vendors append date suffixes.
    if let Some(ref served) = completion.model
        && served != model_id
    {
        debug!(requested = %model_id, served = %served, "Vendor served a model variant");
    }

    let mut response = ChatResponse::new(content, model_id);
    if let Some(u) = completion.usage {
        response = response.with_usage(Usage::reported(
            u.prompt_tokens,
            u.completion_tokens,
            u.total_tokens,
        ));
    }
    Ok(response)
}
