//! The processor use cases.

use std::path::Path;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use clank_core::{tokens, Result, Usage};
use clank_llm::LanguageModel;

use crate::issues::{ExtractedIssue, IssueExtractor};
use crate::review::{Review, ReviewExtractor};
use crate::suggestions::{ExtractedSuggestion, SuggestionExtractor};

/// Every extraction takes the same request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractParams {
    /// What the product is, so the model can tell it apart from the feedback.
    pub context: String,
    /// Allowed categories; empty means every category is `UNKNOWN`.
    #[serde(default)]
    pub categories: Vec<String>,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractIssuesResult {
    pub issues: Vec<ExtractedIssue>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractSuggestionsResult {
    pub suggestions: Vec<ExtractedSuggestion>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractReviewResult {
    pub review: Review,
    pub usage: Usage,
}

pub struct Processor {
    issues: IssueExtractor,
    suggestions: SuggestionExtractor,
    review: ReviewExtractor,
}

impl Processor {
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        Ok(Self {
            issues: IssueExtractor::new(lm.clone(), artifacts_path)?,
            suggestions: SuggestionExtractor::new(lm.clone(), artifacts_path)?,
            review: ReviewExtractor::new(lm, artifacts_path)?,
        })
    }

    pub async fn extract_issues(&self, params: &ExtractParams) -> Result<ExtractIssuesResult> {
        let issues = self
            .issues
            .extract(&params.context, &params.categories, &params.feedback)
            .await?;

        // Two stages: generation, then classification.
        let output_tokens: u64 = issues.iter().map(tokens::count_json).sum();
        let usage = Usage::estimate::<ExtractIssuesResult, _>(params, output_tokens, 2);

        Ok(ExtractIssuesResult { issues, usage })
    }

    pub async fn extract_suggestions(
        &self,
        params: &ExtractParams,
    ) -> Result<ExtractSuggestionsResult> {
        let suggestions = self
            .suggestions
            .extract(&params.context, &params.categories, &params.feedback)
            .await?;

        let output_tokens: u64 = suggestions.iter().map(tokens::count_json).sum();
        let usage = Usage::estimate::<ExtractSuggestionsResult, _>(params, output_tokens, 2);

        Ok(ExtractSuggestionsResult { suggestions, usage })
    }

    pub async fn extract_review(&self, params: &ExtractParams) -> Result<ExtractReviewResult> {
        let review = self
            .review
            .extract(&params.context, &params.categories, &params.feedback)
            .await?;

        let usage =
            Usage::estimate::<ExtractReviewResult, _>(params, tokens::count_json(&review), 1);

        Ok(ExtractReviewResult { review, usage })
    }
}
