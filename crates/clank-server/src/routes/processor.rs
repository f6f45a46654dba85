//! Processor routes. All three take the same request.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Router;

use clank_processor::{
    ExtractIssuesResult, ExtractParams, ExtractReviewResult, ExtractSuggestionsResult,
};

use crate::error::{ApiError, Json};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/extract-issues", post(extract_issues))
        .route("/extract-suggestions", post(extract_suggestions))
        .route("/extract-review", post(extract_review))
}

async fn extract_issues(
    State(state): State<Arc<AppState>>,
    Json(params): Json<ExtractParams>,
) -> Result<axum::Json<ExtractIssuesResult>, ApiError> {
    Ok(axum::Json(state.processor.extract_issues(&params).await?))
}

async fn extract_suggestions(
    State(state): State<Arc<AppState>>,
    Json(params): Json<ExtractParams>,
) -> Result<axum::Json<ExtractSuggestionsResult>, ApiError> {
    Ok(axum::Json(state.processor.extract_suggestions(&params).await?))
}

async fn extract_review(
    State(state): State<Arc<AppState>>,
    Json(params): Json<ExtractParams>,
) -> Result<axum::Json<ExtractReviewResult>, ApiError> {
    Ok(axum::Json(state.processor.extract_review(&params).await?))
}
