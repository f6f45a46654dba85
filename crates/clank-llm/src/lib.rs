//! Clank LLM: chat-completion providers over HTTP, static prompt
//! signatures, few-shot artifacts and the validate-then-retry predictor.
//!
//! Every pipeline talks to the model through the `LanguageModel` trait.
//! `HttpLanguageModel` is selected by backend key from `LmConfig`; tests use
//! `ScriptedModel` (feature `test-util`).

pub mod artifacts;
pub mod backends;
pub mod predictor;
pub mod providers;
pub mod signature;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use artifacts::{load_demos, Artifact, Demo};
pub use backends::{find_backend, Backend, Provider, BACKENDS};
pub use predictor::{Checks, Predictor, DEFAULT_MAX_RETRIES};
pub use providers::HttpLanguageModel;
pub use signature::{render_prompt, Signature};
pub use types::{ChatMessage, Completion, LanguageModel, TokenCount, SYSTEM_PROMPT};

#[cfg(any(test, feature = "test-util"))]
pub use testing::ScriptedModel;

use std::sync::Arc;

use clank_core::{LmConfig, Result};

/// Build the language model selected by `config.backend`.
pub fn create_language_model(config: &LmConfig) -> Result<Arc<dyn LanguageModel>> {
    let model = HttpLanguageModel::from_config(config)?;
    tracing::info!(
        "Language model: {} ({})",
        model.backend().key,
        model.backend().model
    );
    Ok(Arc::new(model))
}
