//! Route handlers.

use super::AppState;
use super::error::ApiError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use chatrelay_application::{SendMessageInput, StreamMessageInput};
use chatrelay_domain::{ChatMessage, Conversation, ConversationId, ModelDescriptor};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Serialize)]
pub struct ModelList {
    pub models: Vec<ModelDescriptor>,
}

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub model: String,
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct StreamRequest {
    pub message: String,
    pub model: String,
}

#[derive(Serialize)]
pub struct ConversationBody {
    pub conversation: Conversation,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList {
        models: state.router.list_models(),
    })
}

pub async fn create_conversation(
    State(state): State<AppState>,
    payload: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConversationBody>), ApiError> {
    let Json(request) = payload?;
    if state.router.descriptor(&request.model).is_none() {
        return Err(chatrelay_application::ChatError::UnknownModel(request.model).into());
    }
    let conversation = state
        .store
        .create_conversation(request.title, &request.model)
        .await?;
    Ok((StatusCode::CREATED, Json(ConversationBody { conversation })))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationBody>, ApiError> {
    let conversation = state.store.get_conversation(&ConversationId::new(id)).await?;
    Ok(Json(ConversationBody { conversation }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let output = state
        .send_message
        .execute(SendMessageInput::new(ConversationId::new(id), request.content))
        .await?;
    Ok(Json(output).into_response())
}

/// Start a streaming exchange and relay its events as SSE.
///
/// Anything that can be rejected without touching storage or a vendor is
/// rejected here with a plain JSON error, before the event stream opens.
pub async fn stream_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StreamRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let conversation = ConversationId::new(id);

    ChatMessage::try_user(request.message.as_str())?;
    state.router.preflight_stream(&request.model)?;
    state.store.get_conversation(&conversation).await?;

    let (rx, _session) = state.stream_message.spawn(StreamMessageInput::new(
        conversation.clone(),
        request.message,
        request.model,
    ));
    debug!(conversation = %conversation, "Relaying stream");

    let events = ReceiverStream::new(rx)
        .map(|event| Ok::<Event, Infallible>(Event::default().data(event.to_json())));
    let sse = Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE));
    Ok(sse.into_response())
}
