//! Shared application state.

use std::sync::Arc;

use clank_aggregator::Aggregator;
use clank_core::{Config, Result};
use clank_infer::{EmbedderBackend, RankerBackend};
use clank_llm::LanguageModel;
use clank_processor::Processor;
use clank_translator::Translator;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: Config,
    pub translator: Translator,
    pub processor: Processor,
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn new(
        config: Config,
        lm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn EmbedderBackend>,
        ranker: Arc<dyn RankerBackend>,
    ) -> Result<Self> {
        let artifacts = config.service.artifacts_path.clone();

        Ok(Self {
            translator: Translator::new(lm.clone(), &artifacts)?,
            processor: Processor::new(lm.clone(), &artifacts)?,
            aggregator: Aggregator::new(lm, embedder, ranker, &artifacts)?,
            config,
        })
    }
}
