//! dualport: serve HTTP and HTTPS on a single listening port.
//!
//! # Architecture Overview
//!
//! ```text
//! Incoming TCP connection
//!     → net::listener (accept loop, one task per connection)
//!     → net::peek     (lookahead wrapper, nothing consumed yet)
//!     → net::sniff    (first byte: 0x16 ⇒ TLS, anything else ⇒ plaintext)
//!         ├─ plaintext → net::redirect (301 to https://host/path, close)
//!         └─ TLS       → net::bridge   (pending-connection queue)
//!                        → tls::TlsEngine (handshake, serve the app router)
//! ```
//!
//! The application behind the port is an opaque `axum::Router`; this crate
//! only decides which protocol a connection speaks and hands it to the right
//! consumer without losing a byte.

pub mod app;
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod server;
pub mod tls;

pub use config::ServerConfig;
pub use lifecycle::Shutdown;
pub use server::Server;
