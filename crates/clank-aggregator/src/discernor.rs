//! Pairwise similarity judgments.
//!
//! A discernor walks the options in order and returns the first one the
//! model judges similar to the query. Options identical to the query match
//! without asking the model.

use std::path::Path;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use clank_core::Result;
use clank_llm::{LanguageModel, Predictor, Signature};

/// The model's verdict on one pair.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct Judgment {
    pub similar: bool,
}

#[derive(Debug, Serialize)]
pub struct IssuePair {
    pub issue_a: String,
    pub issue_b: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionPair {
    pub suggestion_a: String,
    pub suggestion_b: String,
}

/// A signature that judges whether two texts describe the same thing.
pub trait SimilaritySignature: Signature<Output = Judgment> {
    fn pair(query: &str, option: &str) -> Self::Input;
}

pub struct DiscernIssueSimilarity;

impl Signature for DiscernIssueSimilarity {
    const NAME: &'static str = "aggregator/issue_similarity_discernor";
    const INSTRUCTIONS: &'static str = "
Discern whether issue A and issue B, that customers have with a product, are similar or not.
- Both issues are similar only if they are at least 80% similar.
- Customers can have similar issues without writing them the same way.";

    type Input = IssuePair;
    type Output = Judgment;
}

impl SimilaritySignature for DiscernIssueSimilarity {
    fn pair(query: &str, option: &str) -> IssuePair {
        IssuePair {
            issue_a: query.to_string(),
            issue_b: option.to_string(),
        }
    }
}

pub struct DiscernSuggestionSimilarity;

impl Signature for DiscernSuggestionSimilarity {
    const NAME: &'static str = "aggregator/suggestion_similarity_discernor";
    const INSTRUCTIONS: &'static str = "
Discern whether suggestion A and suggestion B, that customers have about a product, are similar or not.
- Both suggestions are similar only if they are at least 80% similar.
- Customers can have similar suggestions without writing them the same way.";

    type Input = SuggestionPair;
    type Output = Judgment;
}

impl SimilaritySignature for DiscernSuggestionSimilarity {
    fn pair(query: &str, option: &str) -> SuggestionPair {
        SuggestionPair {
            suggestion_a: query.to_string(),
            suggestion_b: option.to_string(),
        }
    }
}

/// Outcome of a discernment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discernment {
    /// Position of the first similar option, if any.
    pub index: Option<usize>,
    /// Model judgments made to get there.
    pub judgments: usize,
}

/// Finds the first option similar to a query.
pub struct Discernor<S: SimilaritySignature> {
    predictor: Predictor<S>,
}

pub type IssueDiscernor = Discernor<DiscernIssueSimilarity>;
pub type SuggestionDiscernor = Discernor<DiscernSuggestionSimilarity>;

impl<S: SimilaritySignature> Discernor<S> {
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        Ok(Self {
            predictor: Predictor::new(lm, artifacts_path)?,
        })
    }

    /// Sequential and early-exit: option `k` is only judged after options
    /// `0..k` were judged dissimilar.
    pub async fn discern(&self, query: &str, options: &[String]) -> Result<Discernment> {
        let mut judgments = 0;

        for (index, option) in options.iter().enumerate() {
            if option == query {
                debug!("{}: option {} is identical", S::NAME, index);
                return Ok(Discernment {
                    index: Some(index),
                    judgments,
                });
            }

            let judgment = self
                .predictor
                .predict(&S::pair(query, option), |_, _| {})
                .await?;
            judgments += 1;

            if judgment.similar {
                debug!("{}: option {} judged similar", S::NAME, index);
                return Ok(Discernment {
                    index: Some(index),
                    judgments,
                });
            }
        }

        Ok(Discernment {
            index: None,
            judgments,
        })
    }
}
