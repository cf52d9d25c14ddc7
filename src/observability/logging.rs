//! Structured logging: subscriber setup and the request log middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::observability::metrics;

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured
/// level when set.
pub fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!("backend_api={level},tower_http=info"))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Middleware: log every request/response pair with timing.
///
/// Sits inside the security-headers stage but outside everything else, so
/// the entry is emitted for short-circuited responses (429, host rejection)
/// and for panics the inner boundary turned into 500s. Each request gets a
/// v4 id, echoed back in `x-request-id`.
pub async fn request_logging_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = addr.ip();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        client = %client,
        "Request started"
    );

    let mut response = next.run(request).await;
    let elapsed = start.elapsed();
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        client = %client,
        status = status.as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(method.as_str(), status.as_u16(), start);

    response
}
