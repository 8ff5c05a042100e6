//! Upstream time limits (`[limits]` section)

use chatrelay_application::GatewayLimits;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimitsConfig {
    /// Cap on one single-shot vendor call, in seconds.
    pub request_timeout_secs: u64,
    /// Cap on a whole streaming exchange, in seconds.
    pub stream_timeout_secs: u64,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            stream_timeout_secs: 120,
        }
    }
}

impl FileLimitsConfig {
    pub fn to_limits(&self) -> GatewayLimits {
        GatewayLimits::from_secs(self.request_timeout_secs, self.stream_timeout_secs)
    }
}
