//! Resource handlers and route wiring.

pub mod health;
pub mod orders;
pub mod users;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use crate::http::server::AppState;
use crate::security::admin::{admin_guard_middleware, AdminGuard};

/// Assemble all resource routes under the versioned API prefix.
pub fn router(admin: AdminGuard) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/api/v1/users/stats/summary", get(users::user_stats))
        .route_layer(middleware::from_fn_with_state(
            admin,
            admin_guard_middleware,
        ));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/api/v1/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/v1/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/api/v1/orders/{id}",
            get(orders::get_order).delete(orders::delete_order),
        )
        .route("/api/v1/orders/{id}/status", put(orders::update_order_status))
        .merge(admin_routes)
}
