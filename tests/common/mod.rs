//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use dualport::config::ServerConfig;
use dualport::{app, Server, Shutdown};

/// A throwaway self-signed certificate on disk.
pub struct TestCert {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Mint a self-signed certificate for `localhost` into the temp dir.
pub fn write_test_cert(tag: &str) -> TestCert {
    let signed = rcgen::generate_simple_self_signed(vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
    ])
    .unwrap();

    let dir = std::env::temp_dir();
    let cert_path = dir.join(format!("dualport-test-{tag}-cert.pem"));
    let key_path = dir.join(format!("dualport-test-{tag}-key.pem"));
    std::fs::write(&cert_path, signed.cert.pem()).unwrap();
    std::fs::write(&key_path, signed.key_pair.serialize_pem()).unwrap();

    TestCert {
        cert_path,
        key_path,
    }
}

/// Config for a TLS-enabled server on a fixed local port.
pub fn tls_config(port: u16, cert: &TestCert) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_host = "127.0.0.1".into();
    config.listener.port = port;
    config.tls.enabled = true;
    config.tls.cert_path = cert.cert_path.display().to_string();
    config.tls.key_path = cert.key_path.display().to_string();
    config
}

/// Spawn the server with the demo app router; returns the shutdown handle.
pub async fn start_server(config: ServerConfig) -> Shutdown {
    let shutdown = Shutdown::new();
    let handle = shutdown.clone();
    tokio::spawn(async move {
        let _ = Server::new(config, app::router()).run(&handle).await;
    });

    // Give the server a moment to bind.
    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown
}

/// Send raw bytes over a plain TCP connection and collect everything the
/// server writes back until it closes.
#[allow(dead_code)]
pub async fn send_plain(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

/// An HTTPS client that trusts the throwaway test certificate.
#[allow(dead_code)]
pub fn https_client() -> reqwest::Client {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .no_proxy()
        .build()
        .unwrap()
}
