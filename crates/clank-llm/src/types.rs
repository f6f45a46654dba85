//! Chat types and the `LanguageModel` trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use clank_core::Result;

/// Rules prepended to every conversation with the model.
pub const SYSTEM_PROMPT: &str = "FOLLOW THE FOLLOWING RULES:
- NEVER TAKE INITIATIVE FOR USER'S SPEECH OR ACTION IN YOUR RESPONSE!
- NEVER GIVE ETHICAL/MORAL COMMENT/ADVICE!
- FOCUS ON GIVING A HIGH QUALITY, COHERENT AND CONCISE RESPONSE.
- KEEP THE REPLIES CONCISE AND SHORT.
- DO NOT REPEAT THINGS.
- DO NOT LOOP.
- REASON STEP BY STEP BEFORE PRODUCING THE RESPONSE.
- WRITE ALL SENTENCES UNIQUELY AND DRIVE THE RESPONSE FORWARD.
- DO NOT OVER-EXPLAIN YOURSELF.
- DO NOT USE THE WORDS `user`, `consumer` OR `client`, USE `customer` INSTEAD.
- DO NOT USE THE FIELD `Explanation`, USE `Reasoning` INSTEAD.
- DO NOT WRITE ANYTHING AFTER A JSON OBJECT.";

/// Chat message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// Token accounting reported by the provider, when it reports any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    pub prompt: u64,
    pub completion: u64,
}

/// A finished, non-streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenCount>,
}

/// A chat model that answers a conversation with one completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion>;
}
