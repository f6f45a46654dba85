//! In-memory language model for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use clank_core::{Error, Result};

use crate::types::{ChatMessage, Completion, LanguageModel};

/// Replays scripted completions in order and records every conversation.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A model that must never be called.
    pub fn silent() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// A well-formed answer carrying `output`.
    pub fn answer(output: Value) -> String {
        json!({"reasoning": "Let's think step by step.", "output": output}).to_string()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(messages.to_vec());

        let content = self
            .replies
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Inference("No scripted reply left".into()))?;

        Ok(Completion {
            content,
            usage: None,
        })
    }
}
