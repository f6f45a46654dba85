//! The aggregator use cases: embeddings, duplicate lookup and merging.

use std::path::Path;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use clank_core::{tokens, Result, Usage};
use clank_infer::{EmbedderBackend, RankerBackend};
use clank_llm::LanguageModel;

use crate::discernor::{Discernor, IssueDiscernor, SimilaritySignature, SuggestionDiscernor};
use crate::merger::{IssueMerger, SuggestionMerger};
use crate::types::{Issue, Suggestion};

/// Candidates scoring below this are never shown to the model.
pub const MIN_RANK_SCORE: f32 = 0.30;
/// At most this many candidates are judged per lookup.
pub const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComputeEmbeddingParams {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComputeEmbeddingResult {
    pub embedding: Vec<f32>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimilarIssueParams {
    pub issue: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimilarIssueResult {
    /// One-based position of the matching option, `0` when none matches.
    pub option: usize,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MergeIssuesParams {
    pub issue_a: Issue,
    pub issue_b: Issue,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MergeIssuesResult {
    pub issue: Issue,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimilarSuggestionParams {
    pub suggestion: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimilarSuggestionResult {
    /// One-based position of the matching option, `0` when none matches.
    pub option: usize,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MergeSuggestionsParams {
    pub suggestion_a: Suggestion,
    pub suggestion_b: Suggestion,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MergeSuggestionsResult {
    pub suggestion: Suggestion,
    pub usage: Usage,
}

/// Where a lookup landed.
struct Lookup {
    /// Zero-based index into the caller's options.
    index: Option<usize>,
    judgments: usize,
}

impl Lookup {
    fn none() -> Self {
        Self {
            index: None,
            judgments: 0,
        }
    }

    fn option(&self) -> usize {
        self.index.map_or(0, |i| i + 1)
    }

    /// `str(index)` as the discernor reports it, `-1` when nothing matched.
    fn index_text(&self) -> String {
        self.index.map_or_else(|| "-1".to_string(), |i| i.to_string())
    }
}

pub struct Aggregator {
    embedder: Arc<dyn EmbedderBackend>,
    ranker: Arc<dyn RankerBackend>,
    issue_discernor: IssueDiscernor,
    issue_merger: IssueMerger,
    suggestion_discernor: SuggestionDiscernor,
    suggestion_merger: SuggestionMerger,
}

impl Aggregator {
    pub fn new(
        lm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn EmbedderBackend>,
        ranker: Arc<dyn RankerBackend>,
        artifacts_path: &Path,
    ) -> Result<Self> {
        Ok(Self {
            embedder,
            ranker,
            issue_discernor: Discernor::new(lm.clone(), artifacts_path)?,
            issue_merger: IssueMerger::new(lm.clone(), artifacts_path)?,
            suggestion_discernor: Discernor::new(lm.clone(), artifacts_path)?,
            suggestion_merger: SuggestionMerger::new(lm, artifacts_path)?,
        })
    }

    pub async fn compute_embedding(
        &self,
        params: &ComputeEmbeddingParams,
    ) -> Result<ComputeEmbeddingResult> {
        let embedding = self.embedder.embed(&params.text).await?;

        Ok(ComputeEmbeddingResult {
            embedding,
            usage: Usage::for_embedding(&params.text),
        })
    }

    pub async fn similar_issue(&self, params: &SimilarIssueParams) -> Result<SimilarIssueResult> {
        let lookup = self
            .lookup(&self.issue_discernor, &params.issue, &params.options)
            .await?;

        Ok(SimilarIssueResult {
            option: lookup.option(),
            usage: Usage::estimate::<SimilarIssueResult, _>(
                params,
                tokens::count(&lookup.index_text()),
                lookup.judgments as u64,
            ),
        })
    }

    pub async fn merge_issues(&self, params: &MergeIssuesParams) -> Result<MergeIssuesResult> {
        let issue = self.issue_merger.merge(&params.issue_a, &params.issue_b).await?;
        let usage = Usage::estimate::<MergeIssuesResult, _>(params, tokens::count_json(&issue), 1);

        Ok(MergeIssuesResult { issue, usage })
    }

    pub async fn similar_suggestion(
        &self,
        params: &SimilarSuggestionParams,
    ) -> Result<SimilarSuggestionResult> {
        let lookup = self
            .lookup(&self.suggestion_discernor, &params.suggestion, &params.options)
            .await?;

        Ok(SimilarSuggestionResult {
            option: lookup.option(),
            usage: Usage::estimate::<SimilarSuggestionResult, _>(
                params,
                tokens::count(&lookup.index_text()),
                lookup.judgments as u64,
            ),
        })
    }

    pub async fn merge_suggestions(
        &self,
        params: &MergeSuggestionsParams,
    ) -> Result<MergeSuggestionsResult> {
        let suggestion = self
            .suggestion_merger
            .merge(&params.suggestion_a, &params.suggestion_b)
            .await?;
        let usage =
            Usage::estimate::<MergeSuggestionsResult, _>(params, tokens::count_json(&suggestion), 1);

        Ok(MergeSuggestionsResult { suggestion, usage })
    }

    /// Rank, keep the best few above the threshold, then discern among them.
    async fn lookup<S: SimilaritySignature>(
        &self,
        discernor: &Discernor<S>,
        query: &str,
        options: &[String],
    ) -> Result<Lookup> {
        if options.is_empty() {
            return Ok(Lookup::none());
        }

        let window: Vec<(usize, String)> = self
            .ranker
            .rank(query, options)
            .await?
            .into_iter()
            .filter(|p| p.score >= MIN_RANK_SCORE)
            .take(MAX_CANDIDATES)
            .map(|p| (p.index, p.text))
            .collect();

        if window.is_empty() {
            debug!("No candidate reached {}", MIN_RANK_SCORE);
            return Ok(Lookup::none());
        }

        let texts: Vec<String> = window.iter().map(|(_, text)| text.clone()).collect();
        let discernment = discernor.discern(query, &texts).await?;

        Ok(Lookup {
            index: discernment.index.map(|i| window[i].0),
            judgments: discernment.judgments,
        })
    }
}
