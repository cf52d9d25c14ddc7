//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (check per-IP limits, tier by method)
//!     → host.rs (validate Host header against allow-list)
//!     → admin.rs (bearer key, admin routes only)
//!
//! Outgoing response:
//!     → headers.rs (attach fixed security header set)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input (forwarded-for headers are ignored for limiting)

pub mod admin;
pub mod headers;
pub mod host;
pub mod rate_limit;

pub use admin::AdminGuard;
pub use host::TrustedHosts;
pub use rate_limit::{RateLimiter, RateLimiterState};
