//! Shared HTTP plumbing for the vendor adapters.

use chatrelay_application::ProviderError;
use chatrelay_domain::{ProviderKind, truncate_str};
use reqwest::{Client, Response};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest slice of an error body kept in a `ProviderError` cause.
const ERROR_BODY_LIMIT: usize = 500;

/// Build the HTTP client shared by all adapters.
///
/// Only connecting is bounded here; whole-request and whole-stream limits
/// are applied by the router and the streaming session.
pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("chatrelay/", env!("CARGO_PKG_VERSION")))
        .build()
}

pub(crate) fn transport_error(kind: ProviderKind, err: reqwest::Error) -> ProviderError {
    let cause = if err.is_timeout() {
        format!("timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else if err.is_decode() {
        format!("malformed response: {}", err)
    } else {
        err.to_string()
    };
    ProviderError::new(kind, cause)
}

/// Pass 2xx responses through; turn anything else into a `ProviderError`
/// carrying the status and a bounded prefix of the body.
pub(crate) async fn ensure_success(
    kind: ProviderKind,
    response: Response,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(ProviderError::new(
        kind,
        format!("HTTP {}: {}", status, truncate_str(body.trim(), ERROR_BODY_LIMIT)),
    ))
}
