//! Secure-transport engine wiring.
//!
//! # Data Flow
//! ```text
//! BridgedListener::accept()
//!     → per-connection task
//!     → rustls handshake (bounded by handshake timeout)
//!     → hyper serves the decrypted stream against the application router
//! ```
//!
//! # Design Decisions
//! - Handshake and serving happen off the engine's accept loop, so a slow
//!   handshake cannot delay the next queued connection
//! - Handshake failures close the connection and are logged at debug; the
//!   client retries if it cares
//! - The engine stops when the bridge closes, which happens when the
//!   dispatch loop exits

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use thiserror::Error;
use tokio_rustls::TlsAcceptor;

use crate::net::bridge::{BridgeError, BridgedListener};

/// Error type for TLS setup.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    ReadFile { path: String, source: io::Error },

    #[error("no certificates found in {0}")]
    NoCertificates(String),

    #[error("no private key found in {0}")]
    NoPrivateKey(String),

    #[error("invalid certificate or key: {0}")]
    Config(#[from] rustls::Error),
}

/// Load a rustls server configuration from PEM certificate and key files.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
) -> Result<rustls::ServerConfig, TlsError> {
    let open = |path: &Path| {
        File::open(path).map(BufReader::new).map_err(|source| {
            TlsError::ReadFile {
                path: path.display().to_string(),
                source,
            }
        })
    };

    let certs = rustls_pemfile::certs(&mut open(cert_path)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::ReadFile {
            path: cert_path.display().to_string(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.display().to_string()));
    }

    let key = rustls_pemfile::private_key(&mut open(key_path)?)
        .map_err(|source| TlsError::ReadFile {
            path: key_path.display().to_string(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(key_path.display().to_string()))?;

    // Pin the process-default crypto provider; builder() panics if the
    // dependency graph enables more than one provider and none is installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let mut config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

/// Accept loop over the bridged listener: handshake, then serve.
pub struct TlsEngine {
    acceptor: TlsAcceptor,
    handshake_timeout: Duration,
}

impl TlsEngine {
    pub fn new(config: rustls::ServerConfig, handshake_timeout: Duration) -> Self {
        Self {
            acceptor: TlsAcceptor::from(Arc::new(config)),
            handshake_timeout,
        }
    }

    /// Drain the bridged listener until it closes, serving each connection
    /// with the application router.
    pub async fn run(self, mut listener: BridgedListener, app: Router) {
        tracing::info!(address = %listener.local_addr(), "TLS engine accepting bridged connections");
        loop {
            let (conn, peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(BridgeError::Closed) => {
                    tracing::info!("bridged listener closed, TLS engine stopping");
                    return;
                }
            };

            let acceptor = self.acceptor.clone();
            let app = app.clone();
            let handshake_timeout = self.handshake_timeout;
            tokio::spawn(async move {
                let stream =
                    match tokio::time::timeout(handshake_timeout, acceptor.accept(conn)).await {
                        Ok(Ok(stream)) => stream,
                        Ok(Err(e)) => {
                            tracing::debug!(peer_addr = %peer, error = %e, "TLS handshake failed");
                            return;
                        }
                        Err(_) => {
                            tracing::debug!(peer_addr = %peer, "TLS handshake timed out");
                            return;
                        }
                    };

                let service = TowerToHyperService::new(app);
                if let Err(e) = auto::Builder::new(TokioExecutor::new())
                    .serve_connection_with_upgrades(TokioIo::new(stream), service)
                    .await
                {
                    tracing::debug!(peer_addr = %peer, error = %e, "connection closed with error");
                }
            });
        }
    }
}
