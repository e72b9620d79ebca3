//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files; every
//! field has a default so a minimal config (or none at all) is valid syntax.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the dual-protocol server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind point, pending-queue size).
    pub listener: ListenerConfig,

    /// TLS configuration (enable flag, certificate and key paths).
    pub tls: TlsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host/interface to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// Port to bind. Both protocols share this single port when TLS is on.
    pub port: u16,

    /// Capacity of the pending-TLS-connection queue. Connections sniffed as
    /// TLS while the queue is full are dropped rather than blocking the
    /// dispatch loop.
    pub max_pending_tls: usize,
}

impl ListenerConfig {
    /// The bind address string, e.g. "0.0.0.0:8080".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            max_pending_tls: 1024,
        }
    }
}

/// TLS configuration.
///
/// When `enabled`, the listener serves both plaintext (redirected to HTTPS)
/// and TLS on the same port; the cert and key paths are then mandatory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Enable HTTPS with automatic HTTP→HTTPS redirect on the same port.
    pub enabled: bool,

    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_path: String::new(),
            key_path: String::new(),
        }
    }
}

/// Timeout configuration for connection admission.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Maximum time to wait for the first byte when sniffing a new
    /// connection, in milliseconds. Bounds how long a silent peer can pin a
    /// classification task.
    pub sniff_ms: u64,

    /// Maximum time allowed for the TLS handshake, in milliseconds.
    pub handshake_ms: u64,
}

impl TimeoutConfig {
    pub fn sniff(&self) -> Duration {
        Duration::from_millis(self.sniff_ms)
    }

    pub fn handshake(&self) -> Duration {
        Duration::from_millis(self.handshake_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            sniff_ms: 10_000,
            handshake_ms: 10_000,
        }
    }
}
