//! Translator routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Router;

use clank_translator::{
    DetectLanguageParams, DetectLanguageResult, TranslateFeedbackParams, TranslateFeedbackResult,
};

use crate::error::{ApiError, Json};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/detect-language", post(detect_language))
        .route("/translate-feedback", post(translate_feedback))
}

async fn detect_language(
    State(state): State<Arc<AppState>>,
    Json(params): Json<DetectLanguageParams>,
) -> Result<axum::Json<DetectLanguageResult>, ApiError> {
    Ok(axum::Json(state.translator.detect_language(&params).await?))
}

async fn translate_feedback(
    State(state): State<Arc<AppState>>,
    Json(params): Json<TranslateFeedbackParams>,
) -> Result<axum::Json<TranslateFeedbackResult>, ApiError> {
    Ok(axum::Json(state.translator.translate_feedback(&params).await?))
}
