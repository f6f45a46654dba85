//! Aggregator routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Router;

use clank_aggregator::{
    ComputeEmbeddingParams, ComputeEmbeddingResult, MergeIssuesParams, MergeIssuesResult,
    MergeSuggestionsParams, MergeSuggestionsResult, SimilarIssueParams, SimilarIssueResult,
    SimilarSuggestionParams, SimilarSuggestionResult,
};

use crate::error::{ApiError, Json};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/compute-embedding", post(compute_embedding))
        .route("/similar-issue", post(similar_issue))
        .route("/merge-issues", post(merge_issues))
        .route("/similar-suggestion", post(similar_suggestion))
        .route("/merge-suggestions", post(merge_suggestions))
}

async fn compute_embedding(
    State(state): State<Arc<AppState>>,
    Json(params): Json<ComputeEmbeddingParams>,
) -> Result<axum::Json<ComputeEmbeddingResult>, ApiError> {
    Ok(axum::Json(state.aggregator.compute_embedding(&params).await?))
}

async fn similar_issue(
    State(state): State<Arc<AppState>>,
    Json(params): Json<SimilarIssueParams>,
) -> Result<axum::Json<SimilarIssueResult>, ApiError> {
    Ok(axum::Json(state.aggregator.similar_issue(&params).await?))
}

async fn merge_issues(
    State(state): State<Arc<AppState>>,
    Json(params): Json<MergeIssuesParams>,
) -> Result<axum::Json<MergeIssuesResult>, ApiError> {
    Ok(axum::Json(state.aggregator.merge_issues(&params).await?))
}

async fn similar_suggestion(
    State(state): State<Arc<AppState>>,
    Json(params): Json<SimilarSuggestionParams>,
) -> Result<axum::Json<SimilarSuggestionResult>, ApiError> {
    Ok(axum::Json(state.aggregator.similar_suggestion(&params).await?))
}

async fn merge_suggestions(
    State(state): State<Arc<AppState>>,
    Json(params): Json<MergeSuggestionsParams>,
) -> Result<axum::Json<MergeSuggestionsResult>, ApiError> {
    Ok(axum::Json(state.aggregator.merge_suggestions(&params).await?))
}
