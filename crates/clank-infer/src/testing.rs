//! In-memory embedder and ranker for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use clank_core::Result;

use crate::embedder::EmbedderBackend;
use crate::ranker::{into_ranking, RankedPassage, RankerBackend};

/// Returns a fixed vector per known text and a fallback for the rest.
pub struct StaticEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn new(fallback: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbedderBackend for StaticEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Scores passage `i` with `scores[i]` (zero past the end).
pub struct FixedRanker {
    scores: Vec<f32>,
    calls: AtomicUsize,
}

impl FixedRanker {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RankerBackend for FixedRanker {
    async fn rank(&self, _query: &str, passages: &[String]) -> Result<Vec<RankedPassage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scores: Vec<f32> = (0..passages.len())
            .map(|i| self.scores.get(i).copied().unwrap_or(0.0))
            .collect();
        Ok(into_ranking(passages, &scores))
    }
}
