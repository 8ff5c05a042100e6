//! Google Generative Language adapter (Gemini).
//!
//! Gemini's conversation format differs from OpenAI's in three ways:
//! the assistant role is called `model`, system prompts travel separately as
//! a `systemInstruction`, and every turn is a list of `parts`. The vendor
//! reports no token counts we rely on, so replies carry
//! [`Usage::unsupported`]. Streaming is not offered for this vendor.

use super::http::{ensure_success, transport_error};
use async_trait::async_trait;
use chatrelay_application::{ChatError, FragmentStream, ProviderAdapter, ProviderError};
use chatrelay_domain::{
    ChatMessage, ChatResponse, GenerationParams, ProviderCredential, ProviderKind, Role, Usage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const KIND: ProviderKind = ProviderKind::Google;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

fn vendor_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::User | Role::System => "user",
    }
}

/// Map chat history onto a generateContent request.
///
/// System messages are folded into one `systemInstruction`. The remaining
/// turns keep their order, with the final one as the new user turn. Gemini
/// wants `contents` to open with a user turn and alternate roles, so leading
/// model turns are dropped and same-role neighbours merged into one turn.
fn build_request(
    history: &[ChatMessage],
    params: &GenerationParams,
) -> Result<GenerateContentRequest, ProviderError> {
    let system: Vec<&str> = history
        .iter()
        .filter(|m| m.role() == Role::System)
        .map(ChatMessage::content)
        .collect();
    let turns: Vec<&ChatMessage> = history.iter().filter(|m| m.role() != Role::System).collect();

    let Some((last, prior)) = turns.split_last() else {
        return Err(ProviderError::new(KIND, "no message to send"));
    };

    let turns = prior
        .iter()
        .map(|m| Content::text(vendor_role(m.role()), m.content()))
        .chain(std::iter::once(Content::text("user", last.content())));

    let mut contents: Vec<Content> = Vec::new();
    for turn in turns {
        match contents.last_mut() {
            Some(previous) if previous.role == turn.role => previous.parts.extend(turn.parts),
            None if turn.role.as_deref() == Some("model") => {}
            _ => contents.push(turn),
        }
    }

    let system_instruction = if system.is_empty() {
        None
    } else {
        Some(Content {
            role: None,
            parts: vec![Part {
                text: system.join("\n\n"),
            }],
        })
    };

    Ok(GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: GenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
        },
    })
}

fn into_chat_response(
    response: GenerateContentResponse,
    model_id: &str,
) -> Result<ChatResponse, ProviderError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ProviderError::new(KIND, format!("empty response: {}", reason)));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(ProviderError::new(
            KIND,
            format!("response contained no text (finish reason: {})", reason),
        ));
    }

    Ok(ChatResponse::new(text, model_id).with_usage(Usage::unsupported()))
}

pub struct GoogleGenerativeAdapter {
    client: Client,
    credential: ProviderCredential,
    params: GenerationParams,
}

impl GoogleGenerativeAdapter {
    pub fn new(client: Client, credential: ProviderCredential, params: GenerationParams) -> Self {
        Self {
            client,
            credential,
            params,
        }
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.credential.base_url.trim_end_matches('/'),
            model_id
        )
    }
}

#[async_trait]
impl ProviderAdapter for GoogleGenerativeAdapter {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    fn supports_streaming(&self, _model_id: &str) -> bool {
        false
    }

    async fn chat_once(
        &self,
        history: &[ChatMessage],
        model_id: &str,
    ) -> Result<ChatResponse, ChatError> {
        let body = build_request(history, &self.params)?;
        debug!(
            model = %model_id,
            turns = body.contents.len(),
            system = body.system_instruction.is_some(),
            "Calling generateContent"
        );

        let response = self
            .client
            .post(self.endpoint(model_id))
            .header("x-goog-api-key", &self.credential.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(KIND, e))?;
        let response = ensure_success(KIND, response).await?;
        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| transport_error(KIND, e))?;

        into_chat_response(parsed, model_id).map_err(ChatError::from)
    }

    async fn chat_stream(
        &self,
        _history: &[ChatMessage],
        model_id: &str,
    ) -> Result<FragmentStream, ChatError> {
        Err(ChatError::streaming_unsupported(model_id))
    }
}
