//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the API server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings (bind address, timeouts, body limits).
    pub server: ServerConfig,

    /// Database connection pool settings.
    pub database: DatabaseConfig,

    /// Trusted hosts and CORS origins.
    pub security: SecurityConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Pagination bounds for list endpoints.
    pub pagination: PaginationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub email: EmailConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Database pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (e.g., "sqlite://backend.db?mode=rwc" or "sqlite::memory:").
    pub url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// How long to wait for a free connection, in seconds.
    pub acquire_timeout_secs: u64,

    /// Recycle interval: connections older than this are closed, in seconds.
    pub max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://backend.db?mode=rwc".to_string(),
            max_connections: 20,
            acquire_timeout_secs: 30,
            max_lifetime_secs: 3600,
        }
    }
}

/// Trusted-host and CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Host header allow-list. Entries are exact hostnames, "*" for any,
    /// or "*.example.com" style suffix patterns.
    pub allowed_hosts: Vec<String>,

    /// Allowed CORS origins. A single "*" allows any origin
    /// (without credentials).
    pub cors_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

/// Rate limiting configuration.
///
/// Two independent limits exist: a lenient one for read requests and a
/// strict one for mutating requests (POST/PUT/PATCH/DELETE).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum read requests per identifier per window.
    pub read_max_requests: u32,

    /// Read window length in seconds.
    pub read_window_secs: u64,

    /// Maximum mutating requests per identifier per window.
    pub write_max_requests: u32,

    /// Write window length in seconds.
    pub write_window_secs: u64,

    /// Interval between eviction sweeps of idle identifiers, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            read_max_requests: 100,
            read_window_secs: 60,
            write_max_requests: 20,
            write_window_secs: 60,
            sweep_interval_secs: 300,
        }
    }
}

/// Pagination bounds for list endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the request does not specify one.
    pub default_page_size: u32,

    /// Upper bound on the requested page size.
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin surface configuration (statistics endpoint, apictl).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin-guarded endpoints.
    pub enabled: bool,

    /// API key for authorization (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

/// Outbound notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Sender address stamped on outgoing mail.
    pub from_address: String,

    /// Queue capacity. Notifications beyond this are dropped rather than
    /// blocking the request that produced them.
    pub queue_capacity: usize,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: "noreply@example.com".to_string(),
            queue_capacity: 256,
        }
    }
}
