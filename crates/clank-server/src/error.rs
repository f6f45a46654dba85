//! API error taxonomy.
//!
//! Handlers and extractors return `ApiError`, which only sets the status and
//! stashes itself in the response extensions. `render_errors` runs outside
//! every route and turns any error status, including the bare ones axum and
//! tower-http produce, into the `{code}` / `{code, message}` body.

use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ServerGeneric,
    ServerUnavailable,
    ServerTimeout,
    ClientGeneric,
    InvalidRequest,
    NotFound,
    Unauthorized,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::ServerGeneric => "ERR_SERVER_GENERIC",
            Self::ServerUnavailable => "ERR_SERVER_UNAVAILABLE",
            Self::ServerTimeout => "ERR_SERVER_TIMEOUT",
            Self::ClientGeneric => "ERR_CLIENT_GENERIC",
            Self::InvalidRequest => "ERR_INVALID_REQUEST",
            Self::NotFound => "ERR_NOT_FOUND",
            Self::Unauthorized => "ERR_UNAUTHORIZED",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::ServerGeneric => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ServerTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::ClientGeneric | Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Classify a status produced outside the handlers.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::BAD_REQUEST
            | StatusCode::METHOD_NOT_ALLOWED
            | StatusCode::PAYLOAD_TOO_LARGE
            | StatusCode::UNSUPPORTED_MEDIA_TYPE
            | StatusCode::UNPROCESSABLE_ENTITY => Self::InvalidRequest,
            StatusCode::SERVICE_UNAVAILABLE => Self::ServerUnavailable,
            StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => Self::ServerTimeout,
            s if s.is_client_error() => Self::ClientGeneric,
            _ => Self::ServerGeneric,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound, "Route not found")
    }

    fn from_status(status: StatusCode) -> Self {
        Self::new(
            ErrorKind::from_status(status),
            status.canonical_reason().unwrap_or("Unexpected error"),
        )
    }

    /// The final response; `message` is only exposed in development.
    pub fn render(&self, development: bool) -> Response {
        let body = if development {
            json!({ "code": self.kind.code(), "message": self.message })
        } else {
            json!({ "code": self.kind.code() })
        };
        (self.kind.status(), axum::Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.kind.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<clank_core::Error> for ApiError {
    fn from(err: clank_core::Error) -> Self {
        error!("Request failed: {}", err);
        Self::new(ErrorKind::ServerGeneric, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(ErrorKind::InvalidRequest, rejection.body_text())
    }
}

/// `axum::Json` whose rejections are `ApiError`s.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

/// Panic handler for `CatchPanicLayer`.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);
    ApiError::new(ErrorKind::ServerGeneric, detail).into_response()
}

/// Render every error status with the taxonomy body.
pub async fn render_errors(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let error = response
        .extensions()
        .get::<ApiError>()
        .cloned()
        .unwrap_or_else(|| ApiError::from_status(status));
    error.render(state.config.service.is_development())
}
