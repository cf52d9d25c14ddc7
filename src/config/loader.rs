//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_uses_defaults() {
        let config: AppConfig = toml::from_str("[server]\nbind_address = \"127.0.0.1:9000\"\n")
            .expect("minimal config parses");
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.rate_limit.write_max_requests, 20);
        assert_eq!(config.pagination.max_page_size, 100);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config: AppConfig =
            toml::from_str("[rate_limit]\nread_window_secs = 0\n").expect("parses");
        let result = validate_config(&config);
        assert!(result.is_err());
    }
}
