//! Normalized responses from a non-streaming exchange.

use serde::{Deserialize, Serialize};

/// Token accounting for one exchange.
///
/// Vendors that report usage produce a [`Usage::reported`] record. Vendors
/// that structurally cannot report it produce [`Usage::unsupported`]: zero
/// counts flagged with `supported: false`, so callers can tell "zero tokens"
/// apart from "not reported". A vendor that *could* report usage but did
/// not leaves [`ChatResponse::usage`] as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub supported: bool,
}

impl Usage {
    pub fn reported(prompt_tokens: u32, completion_tokens: u32, total_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            supported: true,
        }
    }

    pub fn unsupported() -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            supported: false,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Total tokens, only when the vendor actually measured them.
    pub fn measured_total(&self) -> Option<u32> {
        self.supported.then_some(self.total_tokens)
    }
}

/// The result of a single-shot chat call, independent of vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}
