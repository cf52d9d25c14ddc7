//! Bearer-key guard for the admin surface.
//!
//! A static key, not an identity system: callers either present the
//! configured key or they lack permission for the guarded routes.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::AdminConfig;
use crate::http::error::ApiError;

#[derive(Clone)]
pub struct AdminGuard {
    config: Arc<AdminConfig>,
}

impl AdminGuard {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            config: Arc::new(config.clone()),
        }
    }

    fn authorize(&self, auth_header: Option<&str>) -> bool {
        if !self.config.enabled {
            return false;
        }
        match auth_header {
            Some(value) => value == format!("Bearer {}", self.config.api_key),
            None => false,
        }
    }
}

pub async fn admin_guard_middleware(
    State(guard): State<AdminGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if guard.authorize(auth_header) {
        next.run(request).await
    } else {
        tracing::warn!(path = %request.uri().path(), "Admin authorization failed");
        ApiError::Forbidden.into_response()
    }
}
