//! Application-level configuration.
//!
//! Time limits that bound every upstream call the use cases make.

use std::time::Duration;

/// Upper bounds on provider calls.
///
/// `request_timeout` caps one non-streaming call. `stream_timeout` caps the
/// whole wall-clock life of a streaming exchange, from opening the upstream
/// request to the last fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayLimits {
    pub request_timeout: Duration,
    pub stream_timeout: Duration,
}

impl Default for GatewayLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            stream_timeout: Duration::from_secs(120),
        }
    }
}

impl GatewayLimits {
    /// Creates limits from second counts, as read from configuration.
    pub fn from_secs(request_secs: u64, stream_secs: u64) -> Self {
        Self {
            request_timeout: Duration::from_secs(request_secs),
            stream_timeout: Duration::from_secs(stream_secs),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }
}
