//! Similarity ranking of candidate passages against a query.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use ndarray::ArrayView1;
use serde::Serialize;

use clank_core::{Error, Result};

use crate::embedder::EmbedderBackend;

/// A candidate with its similarity to the query, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPassage {
    /// Position in the candidate list given to `rank`.
    pub index: usize,
    pub text: String,
    pub score: f32,
}

/// Trait for ranking backends.
#[async_trait]
pub trait RankerBackend: Send + Sync {
    /// Score every passage against `query`, most similar first.
    async fn rank(&self, query: &str, passages: &[String]) -> Result<Vec<RankedPassage>>;
}

/// Clamp scores into `[0, 1]` and order by descending score, ties by index.
pub fn into_ranking(passages: &[String], scores: &[f32]) -> Vec<RankedPassage> {
    let mut ranked: Vec<RankedPassage> = passages
        .iter()
        .zip(scores)
        .enumerate()
        .map(|(index, (text, &score))| RankedPassage {
            index,
            text: text.clone(),
            score: if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) },
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    ranked
}

/// Cosine similarity of two vectors; zero when either has no magnitude.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);
    let norm = a.dot(&a).sqrt() * b.dot(&b).sqrt();
    if norm < 1e-9 {
        return 0.0;
    }
    a.dot(&b) / norm
}

/// Ranks by cosine similarity of embeddings.
pub struct EmbeddingRanker {
    embedder: Arc<dyn EmbedderBackend>,
}

impl EmbeddingRanker {
    pub fn new(embedder: Arc<dyn EmbedderBackend>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl RankerBackend for EmbeddingRanker {
    async fn rank(&self, query: &str, passages: &[String]) -> Result<Vec<RankedPassage>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = std::iter::once(query)
            .chain(passages.iter().map(String::as_str))
            .collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let (query_embedding, passage_embeddings) = embeddings
            .split_first()
            .ok_or_else(|| Error::Inference("Embedder returned no vectors".into()))?;

        if query_embedding.is_empty()
            || passage_embeddings
                .iter()
                .any(|e| e.len() != query_embedding.len())
        {
            return Err(Error::Inference("Embedding dimensions do not match".into()));
        }

        let scores: Vec<f32> = passage_embeddings
            .iter()
            .map(|e| cosine(query_embedding, e))
            .collect();

        Ok(into_ranking(passages, &scores))
    }
}
