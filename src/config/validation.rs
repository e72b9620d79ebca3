//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce the TLS cross-field rules: certificate material without TLS, or
//!   TLS without certificate material, are both fatal
//! - Validate value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before any socket is bound; a failing config never reaches accept

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A cert or key path is set while TLS is disabled. Refusing to start is
    /// better than silently serving plaintext with unused certificates.
    #[error(
        "TLS is disabled but a certificate or key path was given; \
         enable tls or remove the certificate settings"
    )]
    TlsArtifactsWithoutTls,

    /// TLS is enabled but a required artifact path is empty.
    #[error("TLS is enabled but no {0} path was given")]
    MissingTlsArtifact(&'static str),

    /// The pending-TLS queue must hold at least one connection.
    #[error("listener.max_pending_tls must be at least 1")]
    ZeroPendingQueue,

    /// A timeout of zero would fail every connection immediately.
    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.tls.enabled
        && (!config.tls.cert_path.is_empty() || !config.tls.key_path.is_empty())
    {
        errors.push(ValidationError::TlsArtifactsWithoutTls);
    }

    if config.tls.enabled {
        if config.tls.cert_path.is_empty() {
            errors.push(ValidationError::MissingTlsArtifact("certificate"));
        }
        if config.tls.key_path.is_empty() {
            errors.push(ValidationError::MissingTlsArtifact("private key"));
        }
    }

    if config.listener.max_pending_tls == 0 {
        errors.push(ValidationError::ZeroPendingQueue);
    }
    if config.timeouts.sniff_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("sniff_ms"));
    }
    if config.timeouts.handshake_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("handshake_ms"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
