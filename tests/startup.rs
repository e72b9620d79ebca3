//! Startup validation: an inconsistent configuration must fail before any
//! socket is bound.

use std::time::Duration;

use tokio::net::TcpStream;

use dualport::config::ServerConfig;
use dualport::{app, Server, Shutdown};

mod common;

async fn assert_fails_without_binding(config: ServerConfig) {
    let port = config.listener.port;
    let shutdown = Shutdown::new();

    let result = Server::new(config, app::router()).run(&shutdown).await;
    assert!(result.is_err(), "inconsistent config must be rejected");

    // The port must never have been opened.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(
        TcpStream::connect(("127.0.0.1", port)).await.is_err(),
        "no socket may be bound after a validation failure"
    );
}

#[tokio::test]
async fn cert_path_without_tls_is_rejected_before_bind() {
    let mut config = ServerConfig::default();
    config.listener.bind_host = "127.0.0.1".into();
    config.listener.port = 28471;
    config.tls.cert_path = "/tmp/some-cert.pem".into();

    assert_fails_without_binding(config).await;
}

#[tokio::test]
async fn tls_without_key_path_is_rejected_before_bind() {
    let cert = common::write_test_cert("startup-nokey");
    let mut config = ServerConfig::default();
    config.listener.bind_host = "127.0.0.1".into();
    config.listener.port = 28472;
    config.tls.enabled = true;
    config.tls.cert_path = cert.cert_path.display().to_string();

    assert_fails_without_binding(config).await;
}

#[tokio::test]
async fn unreadable_certificate_fails_before_bind() {
    let mut config = ServerConfig::default();
    config.listener.bind_host = "127.0.0.1".into();
    config.listener.port = 28473;
    config.tls.enabled = true;
    config.tls.cert_path = "/nonexistent/cert.pem".into();
    config.tls.key_path = "/nonexistent/key.pem".into();

    assert_fails_without_binding(config).await;
}

#[tokio::test]
async fn shutdown_stops_the_multiplexer() {
    let cert = common::write_test_cert("startup-shutdown");
    let shutdown = common::start_server(common::tls_config(28474, &cert)).await;

    assert!(TcpStream::connect(("127.0.0.1", 28474)).await.is_ok());

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(
        TcpStream::connect(("127.0.0.1", 28474)).await.is_err(),
        "listener must be gone after shutdown"
    );
}
