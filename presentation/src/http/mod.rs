//! HTTP surface: JSON routes plus the SSE relay for streamed replies.
//!
//! All routes live under `/api/chat`, except `/health`.

mod error;
mod handlers;

pub use error::ApiError;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use chatrelay_application::{
    ChatRouter, ConversationLogger, ConversationStore, SendMessageUseCase, StreamMessageUseCase,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ChatRouter>,
    pub store: Arc<dyn ConversationStore>,
    pub send_message: SendMessageUseCase,
    pub stream_message: StreamMessageUseCase,
}

impl AppState {
    pub fn new(
        router: Arc<ChatRouter>,
        store: Arc<dyn ConversationStore>,
        logger: Arc<dyn ConversationLogger>,
    ) -> Self {
        let send_message = SendMessageUseCase::new(router.clone(), store.clone())
            .with_conversation_logger(logger.clone());
        let stream_message = StreamMessageUseCase::new(router.clone(), store.clone())
            .with_conversation_logger(logger);
        Self {
            router,
            store,
            send_message,
            stream_message,
        }
    }
}

/// CORS policy: one configured origin, or any origin when unset.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            warn!("Ignoring invalid CORS origin: {}", e);
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/models", get(handlers::list_models))
        .route("/conversations", post(handlers::create_conversation))
        .route("/conversations/:id", get(handlers::get_conversation))
        .route("/conversations/:id/messages", post(handlers::send_message))
        .route("/conversations/:id/stream", post(handlers::stream_message));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/chat", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stream_events;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chatrelay_application::{
        ChatError, FragmentStream, NoConversationLogger, ProviderAdapter, ProviderError,
    };
    use chatrelay_domain::{
        ChatMessage, ChatResponse, ModelRegistry, ProviderCredential, ProviderCredentials,
        ProviderKind, StreamEvent, Usage,
    };
    use chatrelay_infrastructure::InMemoryConversationStore;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tokio_stream::StreamExt;
    use tower::ServiceExt;

    struct ScriptedAdapter {
        kind: ProviderKind,
        fragments: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedAdapter {
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
            if self.fail {
                return Err(ProviderError::new(self.kind, "upstream 500 body=secret").into());
            }
            Ok(ChatResponse::new(self.fragments.concat(), model_id)
                .with_usage(Usage::reported(5, 2, 7)))
        }

        async fn chat_stream(
            &self,
            _history: &[ChatMessage],
            _model_id: &str,
        ) -> Result<FragmentStream, ChatError> {
            let mut items: Vec<Result<String, ProviderError>> =
                self.fragments.iter().map(|f| Ok(f.to_string())).collect();
            if self.fail {
                items.push(Err(ProviderError::new(self.kind, "reset")));
            }
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    fn app(fail: bool) -> Router {
        let credentials = ProviderCredentials::from_entries(
            [ProviderKind::OpenAi, ProviderKind::Google].map(|kind| {
                (
                    kind,
                    ProviderCredential {
                        api_key: "k".to_string(),
                        base_url: "https://example.test".to_string(),
                    },
                )
            }),
        );
        let registry = Arc::new(ModelRegistry::from_credentials(&credentials));
        let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![
            Arc::new(ScriptedAdapter {
                kind: ProviderKind::OpenAi,
                fragments: vec!["Hel", "lo", " world"],
                fail,
            }),
            Arc::new(ScriptedAdapter {
                kind: ProviderKind::Google,
                fragments: vec!["Bonjour"],
                fail,
            }),
        ];
        let router = Arc::new(ChatRouter::new(registry, adapters));
        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new());
        let state = AppState::new(router, store, Arc::new(NoConversationLogger));
        build_router(state, cors_layer(None))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn call_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = call(app, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn decode_events(bytes: Vec<u8>) -> Vec<StreamEvent> {
        let body = futures::stream::iter([Ok::<_, std::convert::Infallible>(bytes)]);
        stream_events(body)
            .map(|event| event.unwrap())
            .collect()
            .await
    }

    async fn create(app: &Router, model: &str) -> String {
        let (status, body) = call_json(
            app,
            "POST",
            "/api/chat/conversations",
            Some(json!({ "model": model, "title": "Test" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["conversation"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_and_models() {
        let app = app(false);
        let (status, body) = call_json(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = call_json(&app, "GET", "/api/chat/models", None).await;
        assert_eq!(status, StatusCode::OK);
        let models = body["models"].as_array().unwrap();
        assert_eq!(models.len(), 5);
        assert_eq!(models[0]["id"], "gpt-4");
        assert_eq!(models[0]["available"], true);
        assert_eq!(models[3]["supportsStreaming"], false);
        assert_eq!(models[4]["available"], false);
    }

    #[tokio::test]
    async fn send_message_round_trip() {
        let app = app(false);
        let id = create(&app, "gpt-4").await;

        let (status, body) = call_json(
            &app,
            "POST",
            &format!("/api/chat/conversations/{}/messages", id),
            Some(json!({ "content": "Say hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userMessage"]["content"], "Say hello");
        assert_eq!(body["assistantMessage"]["content"], "Hello world");
        assert_eq!(body["usage"]["totalTokens"], 7);

        let (_, body) =
            call_json(&app, "GET", &format!("/api/chat/conversations/{}", id), None).await;
        assert_eq!(body["conversation"]["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn send_message_provider_failure_is_502_with_generic_message() {
        let app = app(true);
        let id = create(&app, "gpt-4").await;

        let (status, body) = call_json(
            &app,
            "POST",
            &format!("/api/chat/conversations/{}/messages", id),
            Some(json!({ "content": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body["error"].as_str().unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn stream_relays_sse_frames() {
        let app = app(false);
        let id = create(&app, "gpt-4").await;

        let (status, bytes) = call(
            &app,
            "POST",
            &format!("/api/chat/conversations/{}/stream", id),
            Some(json!({ "message": "Say hello", "model": "gpt-4" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let events = decode_events(bytes).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::content("Hel"),
                StreamEvent::content("lo"),
                StreamEvent::content(" world"),
                StreamEvent::Done,
            ]
        );

        let (_, body) =
            call_json(&app, "GET", &format!("/api/chat/conversations/{}", id), None).await;
        assert_eq!(body["conversation"]["messages"][1]["content"], "Hello world");
    }

    #[tokio::test]
    async fn stream_failure_ends_with_error_frame() {
        let app = app(true);
        let id = create(&app, "gpt-4").await;

        let (_, bytes) = call(
            &app,
            "POST",
            &format!("/api/chat/conversations/{}/stream", id),
            Some(json!({ "message": "hi", "model": "gpt-4" })),
        )
        .await;
        let events = decode_events(bytes).await;
        assert_eq!(events.len(), 4);
        assert!(events[3].error_message().is_some());

        let (_, body) =
            call_json(&app, "GET", &format!("/api/chat/conversations/{}", id), None).await;
        assert_eq!(body["conversation"]["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stream_rejections_happen_before_the_event_stream() {
        let app = app(false);
        let id = create(&app, "gpt-4").await;
        let uri = format!("/api/chat/conversations/{}/stream", id);

        let (status, _) =
            call_json(&app, "POST", &uri, Some(json!({ "message": "hi", "model": "gemini-pro" })))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call_json(
            &app,
            "POST",
            &uri,
            Some(json!({ "message": "hi", "model": "deepseek-chat" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "This model is not configured");

        let (status, _) =
            call_json(&app, "POST", &uri, Some(json!({ "message": "hi", "model": "gpt-7" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            call_json(&app, "POST", &uri, Some(json!({ "message": "  ", "model": "gpt-4" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call_json(
            &app,
            "POST",
            "/api/chat/conversations/missing/stream",
            Some(json!({ "message": "hi", "model": "gpt-4" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_bodies_are_400() {
        let app = app(false);
        let (status, body) = call_json(
            &app,
            "POST",
            "/api/chat/conversations",
            Some(json!({ "title": "no model" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = call_json(
            &app,
            "POST",
            "/api/chat/conversations",
            Some(json!({ "model": "llama-3" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
