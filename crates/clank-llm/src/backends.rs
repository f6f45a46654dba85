//! Backend table: which provider and model a backend key selects.

use serde::{Deserialize, Serialize};

use clank_core::LmConfig;

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Groq,
    Anyscale,
    Fireworks,
    Anthropic,
}

impl Provider {
    pub fn chat_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1/chat/completions",
            Provider::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Provider::Anyscale => "https://api.endpoints.anyscale.com/v1/chat/completions",
            Provider::Fireworks => "https://api.fireworks.ai/inference/v1/chat/completions",
            Provider::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }

    /// Anthropic speaks the Messages API; everyone else is OpenAI-compatible.
    pub fn is_openai_compatible(&self) -> bool {
        !matches!(self, Provider::Anthropic)
    }

    pub fn api_key<'a>(&self, config: &'a LmConfig) -> Option<&'a str> {
        match self {
            Provider::OpenAI => config.openai_api_key.as_deref(),
            Provider::Groq => config.groq_api_key.as_deref(),
            Provider::Anyscale => config.anyscale_api_key.as_deref(),
            Provider::Fireworks => config.fireworks_api_key.as_deref(),
            Provider::Anthropic => config.anthropic_api_key.as_deref(),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAI => write!(f, "openai"),
            Provider::Groq => write!(f, "groq"),
            Provider::Anyscale => write!(f, "anyscale"),
            Provider::Fireworks => write!(f, "fireworks"),
            Provider::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// A selectable `provider/model` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backend {
    pub key: &'static str,
    pub provider: Provider,
    pub model: &'static str,
}

pub const BACKENDS: &[Backend] = &[
    Backend {
        key: "openai/gpt-4o",
        provider: Provider::OpenAI,
        model: "gpt-4o",
    },
    Backend {
        key: "openai/gpt-4o-mini",
        provider: Provider::OpenAI,
        model: "gpt-4o-mini",
    },
    Backend {
        key: "groq/llama3-8b",
        provider: Provider::Groq,
        model: "llama3-8b-8192",
    },
    Backend {
        key: "anyscale/llama3-8b",
        provider: Provider::Anyscale,
        model: "meta-llama/Meta-Llama-3-8B-Instruct",
    },
    Backend {
        key: "fireworks/llama3.1-8b",
        provider: Provider::Fireworks,
        model: "accounts/fireworks/models/llama-v3p1-8b-instruct",
    },
    Backend {
        key: "anthropic/claude-3.5-haiku",
        provider: Provider::Anthropic,
        model: "claude-3-5-haiku-20241022",
    },
];

pub fn find_backend(key: &str) -> Option<&'static Backend> {
    BACKENDS.iter().find(|b| b.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_backend() {
        let backend = find_backend("groq/llama3-8b").unwrap();
        assert_eq!(backend.provider, Provider::Groq);
        assert_eq!(backend.model, "llama3-8b-8192");
        assert!(find_backend("openai/gpt-5").is_none());
    }

    #[test]
    fn test_keys_are_prefixed_by_provider() {
        for backend in BACKENDS {
            assert!(backend.key.starts_with(&format!("{}/", backend.provider)));
        }
    }

    #[test]
    fn test_api_key_lookup() {
        let config = LmConfig {
            fireworks_api_key: Some("fw-key".into()),
            ..Default::default()
        };
        assert_eq!(Provider::Fireworks.api_key(&config), Some("fw-key"));
        assert_eq!(Provider::OpenAI.api_key(&config), None);
        assert!(!Provider::Anthropic.is_openai_compatible());
    }
}
