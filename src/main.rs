//! dualport binary: parse flags, load config, run the front end.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dualport::config::{self, ServerConfig};
use dualport::{app, Server, Shutdown};

#[derive(Parser)]
#[command(name = "dualport")]
#[command(about = "Single-port HTTP/HTTPS front end", long_about = None)]
struct Cli {
    /// Server listen port
    #[arg(long)]
    port: Option<u16>,

    /// Enable HTTPS (with automatic HTTP -> HTTPS redirect on the same port)
    #[arg(long)]
    https: bool,

    /// Path to the TLS certificate file (PEM)
    #[arg(long)]
    tls_cert: Option<String>,

    /// Path to the TLS private key file (PEM)
    #[arg(long)]
    tls_key: Option<String>,

    /// Optional TOML configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ServerConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if self.https {
            config.tls.enabled = true;
        }
        if let Some(cert) = self.tls_cert {
            config.tls.cert_path = cert;
        }
        if let Some(key) = self.tls_key {
            config.tls.key_path = key;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dualport=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    // Fail fast, before any socket is bound.
    if let Err(errors) = config::validate_config(&config) {
        for error in &errors {
            tracing::error!(error = %error, "invalid configuration");
        }
        std::process::exit(1);
    }

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        tls_enabled = config.tls.enabled,
        "configuration loaded"
    );

    let shutdown = Shutdown::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal.trigger();
        }
    });

    let server = Server::new(config, app::router());
    if let Err(e) = server.run(&shutdown).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }

    tracing::info!("shutdown complete");
}
