//! Clank Aggregator: embeddings, duplicate detection and merging of
//! issues and suggestions.
//!
//! Duplicate detection narrows the candidates with the ranker (score
//! threshold, small window) and then asks the model, one candidate at a
//! time, whether the pair describes the same thing.

pub mod aggregator;
pub mod discernor;
pub mod merger;
pub mod types;

pub use aggregator::{
    Aggregator, ComputeEmbeddingParams, ComputeEmbeddingResult, MergeIssuesParams,
    MergeIssuesResult, MergeSuggestionsParams, MergeSuggestionsResult, SimilarIssueParams,
    SimilarIssueResult, SimilarSuggestionParams, SimilarSuggestionResult, MAX_CANDIDATES,
    MIN_RANK_SCORE,
};
pub use discernor::{Discernment, Discernor, IssueDiscernor, SuggestionDiscernor};
pub use merger::{IssueMerger, SuggestionMerger};
pub use types::{Issue, Suggestion};
