//! Embedding backend trait and the OpenAI embeddings client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use clank_core::{Error, Result};

pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Trait for embedding backends.
#[async_trait]
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// `text-embedding-3-small` over the OpenAI embeddings API.
pub struct OpenAiEmbedder {
    client: Client,
    url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: EMBEDDINGS_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    async fn request(&self, input: serde_json::Value) -> Result<Vec<Vec<f32>>> {
        let body = json!({
            "model": EMBEDDING_MODEL,
            "input": input,
            "encoding_format": "float",
        });

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("Invalid embeddings response: {}", e)))?;

        Ok(into_ordered(parsed.data))
    }
}

fn into_ordered(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

#[async_trait]
impl EmbedderBackend for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Embedding {} chars with {}", text.len(), EMBEDDING_MODEL);
        self.request(json!(text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference("Embeddings response is empty".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding batch of {} with {}", texts.len(), EMBEDDING_MODEL);
        let embeddings = self.request(json!(texts)).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::Inference(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}
