//! Request logging.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// One event per request, tagged with a fresh trace id that is echoed back
/// in the `x-trace-id` header.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let trace_id = Uuid::new_v4().to_string();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let ip_address = client_ip(&request);

    let mut response = next.run(request).await;

    let latency = format!("{:.2}", start.elapsed().as_secs_f64() * 1000.0);
    info!(
        host = %host,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        ip_address = %ip_address,
        latency = %latency,
        timestamp = %chrono::Utc::now().to_rfc3339(),
        trace_id = %trace_id,
        "{} {}",
        method,
        path
    );

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        return forwarded.trim().to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}
