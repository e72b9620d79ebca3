//! Server orchestration: one bind point, one or two protocol surfaces.
//!
//! # Responsibilities
//! - Validate configuration before binding anything
//! - TLS disabled: serve the application directly over plaintext, no sniffing
//! - TLS enabled: bind one socket, sniff every connection, redirect plaintext
//!   and feed TLS through the bridge to the secure-transport engine

use std::io;
use std::path::Path;

use axum::Router;
use thiserror::Error;

use crate::config::{validate_config, ConfigError, ServerConfig};
use crate::lifecycle::Shutdown;
use crate::net::bridge;
use crate::net::listener::{DispatchLoop, ListenerError};
use crate::tls::{self, TlsEngine, TlsError};

/// Error type for server startup and serving.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("server i/o error: {0}")]
    Io(#[from] io::Error),
}

/// The dual-protocol server front end.
///
/// The application is an opaque `axum::Router`; this type never looks inside
/// it.
pub struct Server {
    config: ServerConfig,
    app: Router,
}

impl Server {
    pub fn new(config: ServerConfig, app: Router) -> Self {
        Self { config, app }
    }

    /// Validate, bind, and serve until shutdown.
    ///
    /// Validation failures return before any socket exists.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), ServeError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        if self.config.tls.enabled {
            self.run_multiplexed(shutdown).await
        } else {
            self.run_plain(shutdown).await
        }
    }

    /// Plaintext-only mode: hand the socket straight to the application.
    async fn run_plain(self, shutdown: &Shutdown) -> Result<(), ServeError> {
        let listener =
            tokio::net::TcpListener::bind(self.config.listener.bind_address()).await?;
        tracing::info!(
            address = %listener.local_addr()?,
            "HTTP server starting"
        );

        let mut signal = shutdown.subscribe();
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = signal.recv().await;
        })
        .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Dual-protocol mode: sniff each connection on the shared port.
    async fn run_multiplexed(self, shutdown: &Shutdown) -> Result<(), ServeError> {
        // Load certificates before binding so a bad path fails fast with the
        // port untouched.
        let tls_config = tls::load_server_config(
            Path::new(&self.config.tls.cert_path),
            Path::new(&self.config.tls.key_path),
        )?;

        let dispatch = DispatchLoop::bind(&self.config.listener.bind_address()).await?;
        let local_addr = dispatch.local_addr();

        let (tls_queue, bridged) = bridge::bridge(local_addr, self.config.listener.max_pending_tls);
        let engine = TlsEngine::new(tls_config, self.config.timeouts.handshake());
        let engine_task = tokio::spawn(engine.run(bridged, self.app.clone()));

        tracing::info!(
            address = %local_addr,
            "HTTPS server starting (plaintext connections redirected on the same port)"
        );

        let result = dispatch
            .run(tls_queue, self.config.timeouts.sniff(), shutdown.subscribe())
            .await;

        // The dispatch loop owned the last BridgeSender; with it gone the
        // bridged listener closes and the engine winds down on its own.
        let _ = engine_task.await;

        tracing::info!("HTTPS server stopped");
        result.map_err(Into::into)
    }
}
