//! Health and root endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::server::AppState;
use crate::store;

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
}

/// Health probe for load balancers: degrades when the database is down
/// but always answers 200 so the prober sees the detail.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheck> {
    let database_ok = store::ping(&state.pool).await;
    if !database_ok {
        tracing::error!("Database health check failed");
    }
    Json(HealthCheck {
        status: if database_ok { "healthy" } else { "degraded" },
        timestamp: Utc::now(),
        database: if database_ok { "healthy" } else { "unhealthy" },
    })
}

/// Service banner.
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "backend-api is running",
        "health": "/health",
    }))
}
