//! Clank Processor: turns one piece of customer feedback into issues,
//! suggestions and a review.
//!
//! Issues and suggestions are extracted in two stages: one call lists the
//! items the customer explicitly stated, then one call per item infers its
//! severity (or importance) and category. Reviews take a single call.

pub mod issues;
pub mod processor;
pub mod review;
pub mod suggestions;

pub use issues::{ExtractedIssue, IssueExtractor};
pub use processor::{
    ExtractIssuesResult, ExtractParams, ExtractReviewResult, ExtractSuggestionsResult, Processor,
};
pub use review::{Review, ReviewExtractor};
pub use suggestions::{ExtractedSuggestion, SuggestionExtractor};
