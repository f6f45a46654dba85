//! ONNX cross-encoder ranker.
//!
//! Loads a BERT-style cross-encoder (e.g. ms-marco-MiniLM) exported to ONNX
//! together with its HuggingFace tokenizer. Each query/passage pair is
//! encoded jointly and scored with sigmoid(logit). Requires the `onnx`
//! feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{debug, info};

    use clank_core::{Error, Result};

    use crate::ranker::{into_ranking, RankedPassage, RankerBackend};

    /// Maximum sequence length for the model.
    const MAX_SEQ_LEN: usize = 512;

    /// ONNX cross-encoder ranker.
    pub struct OnnxRanker {
        session: Arc<Mutex<Session>>,
        tokenizer: Arc<Tokenizer>,
    }

    impl OnnxRanker {
        /// Load an ONNX model and tokenizer from the given directory.
        ///
        /// Expects:
        /// - `model_dir/model.onnx`: the ONNX model file
        /// - `model_dir/tokenizer.json`: the HuggingFace tokenizer
        pub fn load(model_dir: &Path) -> std::result::Result<Self, String> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(format!("Model not found: {}", model_path.display()));
            }
            if !tokenizer_path.exists() {
                return Err(format!("Tokenizer not found: {}", tokenizer_path.display()));
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.so
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| format!("Failed to create session builder: {}", e))?
                .with_intra_threads(2)
                .map_err(|e| format!("Failed to set threads: {}", e))?
                .commit_from_file(&model_path)
                .map_err(|e| format!("Failed to load ONNX model: {}", e))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| format!("Failed to load tokenizer: {}", e))?;

            info!("ONNX ranker loaded: model={}", model_path.display());

            Ok(Self {
                session: Arc::new(Mutex::new(session)),
                tokenizer: Arc::new(tokenizer),
            })
        }
    }

    fn score_pair(
        session: &Mutex<Session>,
        tokenizer: &Tokenizer,
        query: &str,
        passage: &str,
    ) -> Result<f32> {
        let encoding = tokenizer
            .encode((query, passage), true)
            .map_err(|e| Error::Inference(format!("Tokenization failed: {}", e)))?;

        let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
        let ids: Vec<i64> = encoding.get_ids()[..seq_len]
            .iter()
            .map(|&id| id as i64)
            .collect();
        let mask: Vec<i64> = encoding.get_attention_mask()[..seq_len]
            .iter()
            .map(|&m| m as i64)
            .collect();
        let type_ids: Vec<i64> = encoding.get_type_ids()[..seq_len]
            .iter()
            .map(|&t| t as i64)
            .collect();

        let tensor = |data: Vec<i64>| {
            Tensor::from_array(([1usize, seq_len], data))
                .map_err(|e| Error::Inference(format!("Failed to create tensor: {}", e)))
        };
        let inputs = ort::inputs![tensor(ids)?, tensor(mask)?, tensor(type_ids)?];

        let mut session = session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| Error::Inference(format!("ONNX inference failed: {}", e)))?;

        // Logits are [1, 1] (or [1] for some exports).
        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(format!("Failed to extract logits: {}", e)))?;

        let logit = data
            .first()
            .copied()
            .ok_or_else(|| Error::Inference("Model produced no logits".into()))?;

        Ok(sigmoid(logit))
    }

    fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-x).exp())
    }

    #[async_trait]
    impl RankerBackend for OnnxRanker {
        async fn rank(&self, query: &str, passages: &[String]) -> Result<Vec<RankedPassage>> {
            if passages.is_empty() {
                return Ok(Vec::new());
            }

            debug!("Cross-encoding {} passages", passages.len());

            let session = Arc::clone(&self.session);
            let tokenizer = Arc::clone(&self.tokenizer);
            let query = query.to_string();
            let owned = passages.to_vec();

            let scores = tokio::task::spawn_blocking(move || {
                owned
                    .iter()
                    .map(|passage| score_pair(&session, &tokenizer, &query, passage))
                    .collect::<Result<Vec<f32>>>()
            })
            .await
            .map_err(|e| Error::Internal(format!("Ranker task failed: {}", e)))??;

            Ok(into_ranking(passages, &scores))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_sigmoid() {
            assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
            assert!(sigmoid(8.0) > 0.99);
            assert!(sigmoid(-8.0) < 0.01);
        }

        #[test]
        fn test_load_missing_model() {
            let err = OnnxRanker::load(Path::new("/nonexistent/ranker")).err().unwrap();
            assert!(err.contains("Model not found"));
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxRanker;
