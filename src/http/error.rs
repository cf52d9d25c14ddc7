//! API error taxonomy and HTTP status mapping.
//!
//! Domain errors (404/400/403/429) propagate unmodified to the HTTP layer.
//! Everything else is logged with full context server-side and reaches the
//! caller only as a generic 500 body.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or out-of-contract input, local to request parsing.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness or state-transition conflict.
    #[error("{0}")]
    Conflict(String),

    /// Lookup by identifier yielded no row.
    #[error("{0}")]
    NotFound(&'static str),

    /// Caller lacks the required permission.
    #[error("Not enough permissions")]
    Forbidden,

    /// Host header failed the allow-list check.
    #[error("Invalid host header")]
    InvalidHost,

    /// Rejected by the rate limiter before the handler ran.
    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after: u64 },

    /// Storage engine failure; surfaced to the caller as a generic 500.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail, retry_after) = match &self {
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string(), None),
            ApiError::Conflict(_) => (StatusCode::BAD_REQUEST, self.to_string(), None),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string(), None),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string(), None),
            ApiError::InvalidHost => (StatusCode::BAD_REQUEST, self.to_string(), None),
            ApiError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                self.to_string(),
                Some(*retry_after),
            ),
            ApiError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorBody {
            detail,
            retry_after,
        });

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = header::HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("User not found").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limited_carries_retry_after_header() {
        let response = ApiError::RateLimited { retry_after: 60 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            &header::HeaderValue::from_static("60")
        );
    }
}
