//! Mapping of core errors onto HTTP responses.
//!
//! Bodies are always `{"error": "<caller-safe message>"}`. Vendor causes are
//! logged here and never copied into a response.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chatrelay_application::{ChatError, SendMessageError, StoreError};
use chatrelay_domain::DomainError;
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = match &err {
            ChatError::UnknownModel(_) | ChatError::UnsupportedOperation { .. } => {
                StatusCode::BAD_REQUEST
            }
            ChatError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::Provider(cause) => {
                warn!(vendor = %cause.vendor, cause = %cause.cause, "Upstream failure");
                StatusCode::BAD_GATEWAY
            }
        };
        Self::new(status, err.user_message())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConversationNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "Conversation not found")
            }
            StoreError::Backend(cause) => {
                error!(cause = %cause, "Storage failure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to save the conversation",
                )
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<SendMessageError> for ApiError {
    fn from(err: SendMessageError) -> Self {
        match err {
            SendMessageError::InvalidInput(e) => e.into(),
            SendMessageError::Store(e) => e.into(),
            SendMessageError::Chat(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
