//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Validation(Vec<ValidationError>),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServerConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_parses_with_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.port, 8080);
        assert!(!config.tls.enabled);
    }

    #[test]
    fn full_toml_round_trips() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            bind_host = "127.0.0.1"
            port = 8443
            max_pending_tls = 64

            [tls]
            enabled = true
            cert_path = "cert.pem"
            key_path = "key.pem"

            [timeouts]
            sniff_ms = 2000
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address(), "127.0.0.1:8443");
        assert!(config.tls.enabled);
        assert_eq!(config.timeouts.sniff_ms, 2000);
        assert_eq!(config.timeouts.handshake_ms, 10_000);
    }
}
