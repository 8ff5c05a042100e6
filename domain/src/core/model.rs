//! Model catalogue value objects

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Upstream vendor that serves a model (Value Object)
///
/// This is a closed set: adding a vendor means adding a variant here and
/// an adapter for it, never matching on model id strings elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI chat completions API.
    OpenAi,
    /// Google Generative Language API (Gemini).
    Google,
    /// DeepSeek, served through an OpenAI-compatible API.
    DeepSeek,
}

impl ProviderKind {
    /// All known providers, in catalogue order.
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAi,
        ProviderKind::Google,
        ProviderKind::DeepSeek,
    ];

    /// Human-facing vendor name, as shown in the model picker.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Google => "Google",
            ProviderKind::DeepSeek => "DeepSeek",
        }
    }

    /// Lowercase key used in configuration sections (`[providers.<key>]`).
    pub fn config_key(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Google => "gemini",
            ProviderKind::DeepSeek => "deepseek",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "google" | "gemini" => Ok(ProviderKind::Google),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

impl Serialize for ProviderKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A model the gateway can route to (Value Object)
///
/// Built once at startup from the static catalogue plus credential
/// presence. `available` is never checked against the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: String,
    pub provider: ProviderKind,
    pub display_name: String,
    pub description: String,
    pub max_tokens: u32,
    pub supports_streaming: bool,
    pub available: bool,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        provider: ProviderKind,
        display_name: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            display_name: display_name.into(),
            description: String::new(),
            max_tokens,
            supports_streaming: true,
            available: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn without_streaming(mut self) -> Self {
        self.supports_streaming = false;
        self
    }

    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!("google".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!(
            "DeepSeek".parse::<ProviderKind>().unwrap(),
            ProviderKind::DeepSeek
        );
        assert!("anthropic".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let descriptor = ModelDescriptor::new("gpt-4", ProviderKind::OpenAi, "GPT-4", 8192)
            .with_availability(true);
        let json = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(json["id"], "gpt-4");
        assert_eq!(json["provider"], "OpenAI");
        assert_eq!(json["displayName"], "GPT-4");
        assert_eq!(json["maxTokens"], 8192);
        assert_eq!(json["supportsStreaming"], true);
        assert_eq!(json["available"], true);
    }

    #[test]
    fn test_descriptor_builder_defaults() {
        let descriptor =
            ModelDescriptor::new("gemini-pro", ProviderKind::Google, "Gemini Pro", 32768)
                .without_streaming();
        assert!(!descriptor.supports_streaming);
        assert!(!descriptor.available);
        assert!(descriptor.description.is_empty());
    }
}
