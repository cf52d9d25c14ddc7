//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → api handlers (filter/sort/paginate against the store)
//!     → pagination.rs (page envelope)
//!     → error.rs (status mapping for every failure)
//! ```

pub mod error;
pub mod pagination;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
