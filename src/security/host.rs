//! Trusted-host validation.
//!
//! Requests whose Host header matches no configured pattern are rejected
//! before reaching any handler. Patterns are exact hostnames, "*" for any
//! host, or "*.example.com" style suffix wildcards.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::SecurityConfig;
use crate::http::error::ApiError;

/// Allow-list compiled from [`SecurityConfig::allowed_hosts`].
#[derive(Clone)]
pub struct TrustedHosts {
    patterns: Arc<Vec<String>>,
}

impl TrustedHosts {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            patterns: Arc::new(config.allowed_hosts.clone()),
        }
    }

    /// Match a hostname (no port) against the configured patterns.
    pub fn matches(&self, host: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            if pattern == "*" {
                true
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                // "*.example.com" → suffix ".example.com"; the dot stays in
                // the comparison so "notexample.com" does not slip through.
                host.ends_with(suffix)
            } else {
                pattern == host
            }
        })
    }
}

/// Strip an optional `:port` suffix from a Host header value.
fn hostname(host_header: &str) -> &str {
    // IPv6 literals keep their brackets: "[::1]:8080" → "[::1]".
    if let Some(end) = host_header.rfind(']') {
        return &host_header[..=end];
    }
    match host_header.rsplit_once(':') {
        Some((name, _port)) => name,
        None => host_header,
    }
}

/// Middleware: reject requests whose declared host is not allow-listed.
pub async fn trusted_host_middleware(
    State(hosts): State<TrustedHosts>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let host_value = request
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if hosts.matches(hostname(host_value)) {
        next.run(request).await
    } else {
        tracing::warn!(host = host_value, "Rejected request from untrusted host");
        ApiError::InvalidHost.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(patterns: &[&str]) -> TrustedHosts {
        TrustedHosts::new(&SecurityConfig {
            allowed_hosts: patterns.iter().map(|s| s.to_string()).collect(),
            cors_origins: vec![],
        })
    }

    #[test]
    fn exact_match() {
        let hosts = hosts(&["localhost", "127.0.0.1"]);
        assert!(hosts.matches("localhost"));
        assert!(hosts.matches("127.0.0.1"));
        assert!(!hosts.matches("evil.example.com"));
    }

    #[test]
    fn wildcard_matches_everything() {
        assert!(hosts(&["*"]).matches("anything.at.all"));
    }

    #[test]
    fn suffix_wildcard() {
        let hosts = hosts(&["*.example.com"]);
        assert!(hosts.matches("api.example.com"));
        assert!(!hosts.matches("example.org"));
        // The bare suffix itself is not covered by "*.".
        assert!(!hosts.matches("example.com"));
    }

    #[test]
    fn port_is_stripped() {
        assert_eq!(hostname("localhost:8000"), "localhost");
        assert_eq!(hostname("localhost"), "localhost");
        assert_eq!(hostname("[::1]:8000"), "[::1]");
    }
}
