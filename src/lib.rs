//! backend-api: REST backend for users and orders.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌────────────────────────────────────────────────┐
//!                  │                  API SERVER                     │
//!                  │                                                 │
//!  Client Request  │  ┌──────────┐  ┌──────────┐  ┌─────────────┐   │
//!  ────────────────┼─▶│ security │─▶│ pipeline │─▶│  handlers   │   │
//!                  │  │ headers/ │  │ logging/ │  │ users/orders│   │
//!                  │  │ host     │  │ ratelimit│  │ /health     │   │
//!                  │  └──────────┘  └──────────┘  └──────┬──────┘   │
//!                  │                                      │          │
//!                  │                                      ▼          │
//!                  │                               ┌─────────────┐   │
//!  Client Response │                               │    store    │◀──┼── SQLite
//!  ◀───────────────┼───────────────────────────────│ (sqlx pool) │   │
//!                  │                               └─────────────┘   │
//!                  │                                                 │
//!                  │  ┌───────────────────────────────────────────┐  │
//!                  │  │           Cross-Cutting Concerns           │  │
//!                  │  │  config · observability · notify ·        │  │
//!                  │  │  lifecycle (shutdown)                      │  │
//!                  │  └───────────────────────────────────────────┘  │
//!                  └────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod api;
pub mod config;
pub mod http;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
