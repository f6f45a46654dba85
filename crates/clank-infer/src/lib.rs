//! Clank Infer: embedding backend and similarity rankers.
//!
//! Provides the `EmbedderBackend` trait (OpenAI embeddings API) and the
//! `RankerBackend` trait. When the `onnx` feature is enabled and the
//! cross-encoder files are present, `OnnxRanker` scores query/passage pairs
//! locally. Without it, `EmbeddingRanker` falls back to embedding cosine
//! similarity.

pub mod embedder;
pub mod onnx_ranker;
pub mod ranker;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use embedder::{EmbedderBackend, OpenAiEmbedder, EMBEDDING_MODEL};
pub use ranker::{EmbeddingRanker, RankedPassage, RankerBackend};

#[cfg(feature = "onnx")]
pub use onnx_ranker::OnnxRanker;

#[cfg(any(test, feature = "test-util"))]
pub use testing::{FixedRanker, StaticEmbedder};

use std::path::Path;
use std::sync::Arc;

/// Create the best available ranker for the given resources directory.
///
/// Tries the ONNX cross-encoder in `{resources}/ranker` first (if the feature
/// is enabled and the model files are present), falls back to embedding
/// cosine similarity.
pub fn create_ranker(
    resources_path: &Path,
    embedder: Arc<dyn EmbedderBackend>,
) -> Arc<dyn RankerBackend> {
    #[cfg(feature = "onnx")]
    {
        match OnnxRanker::load(&resources_path.join("ranker")) {
            Ok(ranker) => {
                tracing::info!("Using ONNX cross-encoder ranker");
                return Arc::new(ranker);
            }
            Err(e) => {
                tracing::warn!("ONNX ranker unavailable: {}. Falling back to embedding similarity.", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = resources_path;
        tracing::info!("ONNX feature disabled. Ranking by embedding similarity.");
    }

    Arc::new(EmbeddingRanker::new(embedder))
}
