//! HTTP route handlers.

pub mod aggregator;
pub mod health;
pub mod processor;
pub mod translator;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::error::{handle_panic, render_errors, ApiError};
use crate::logging::log_requests;
use crate::state::AppState;

/// Largest accepted request body.
pub const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::routes())
        .nest("/translator", translator::routes())
        .nest("/processor", processor::routes())
        .nest("/aggregator", aggregator::routes())
        .fallback(|| async { ApiError::not_found() })
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(middleware::from_fn_with_state(state.clone(), render_errors))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}
