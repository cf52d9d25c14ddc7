//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Validation is a pure function over the config and returns all errors,
//! not just the first, so an operator can fix a bad file in one pass.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic violation found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "rate_limit.read_window_secs").
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the full configuration, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("not a valid socket address: {:?}", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "server.max_body_bytes",
            "must be greater than zero",
        ));
    }

    if config.database.url.is_empty() {
        errors.push(ValidationError::new("database.url", "must not be empty"));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new(
            "database.max_connections",
            "must be greater than zero",
        ));
    }

    if config.security.allowed_hosts.is_empty() {
        errors.push(ValidationError::new(
            "security.allowed_hosts",
            "must contain at least one host pattern",
        ));
    }

    let rl = &config.rate_limit;
    if rl.enabled {
        for (field, value) in [
            ("rate_limit.read_max_requests", rl.read_max_requests as u64),
            ("rate_limit.write_max_requests", rl.write_max_requests as u64),
            ("rate_limit.read_window_secs", rl.read_window_secs),
            ("rate_limit.write_window_secs", rl.write_window_secs),
            ("rate_limit.sweep_interval_secs", rl.sweep_interval_secs),
        ] {
            if value == 0 {
                errors.push(ValidationError::new(field, "must be greater than zero"));
            }
        }
    }

    let pg = &config.pagination;
    if pg.max_page_size == 0 {
        errors.push(ValidationError::new(
            "pagination.max_page_size",
            "must be greater than zero",
        ));
    }
    if pg.default_page_size == 0 || pg.default_page_size > pg.max_page_size {
        errors.push(ValidationError::new(
            "pagination.default_page_size",
            "must be between 1 and max_page_size",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "not a valid socket address: {:?}",
                config.observability.metrics_address
            ),
        ));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "must be set when the admin surface is enabled",
        ));
    }

    if config.email.queue_capacity == 0 {
        errors.push(ValidationError::new(
            "email.queue_capacity",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors_not_just_first() {
        let mut config = AppConfig::default();
        config.server.bind_address = "not-an-address".into();
        config.rate_limit.read_window_secs = 0;
        config.pagination.default_page_size = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "server.bind_address"));
        assert!(errors.iter().any(|e| e.field == "rate_limit.read_window_secs"));
        assert!(errors.iter().any(|e| e.field == "pagination.default_page_size"));
    }

    #[test]
    fn disabled_rate_limit_skips_window_checks() {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.read_window_secs = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn page_size_must_not_exceed_max() {
        let mut config = AppConfig::default();
        config.pagination.default_page_size = 500;
        config.pagination.max_page_size = 100;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "pagination.default_page_size");
    }

    #[test]
    fn admin_key_required_when_enabled() {
        let mut config = AppConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "admin.api_key");
    }
}
