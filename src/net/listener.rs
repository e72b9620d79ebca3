//! Raw acceptor and dispatch loop.
//!
//! # Responsibilities
//! - Bind the single shared socket
//! - Accept raw connections and spawn one task per connection, immediately
//! - Per task: sniff under a timeout, then redirect (plaintext) or enqueue
//!   on the bridge (TLS)
//! - Classify accept errors as transient or fatal
//!
//! # Accept-error policy (Linux / tokio)
//! `accept(2)` can surface errors that belong to the just-arrived connection
//! rather than the listening socket: ECONNABORTED, ECONNRESET, EINTR. Those
//! are skipped and the loop continues. ENFILE/EMFILE mean the process is out
//! of file descriptors; backing off briefly lets in-flight connections
//! release some. Any other error means the listening socket itself is
//! unusable and terminates the loop.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::net::bridge::BridgeSender;
use crate::net::peek::PeekStream;
use crate::net::redirect;
use crate::net::sniff::{self, Protocol};

/// Error type for the dispatch loop.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(io::Error),
}

const ENFILE: i32 = 23;
const EMFILE: i32 = 24;

fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

fn is_fd_exhaustion(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(ENFILE) | Some(EMFILE))
}

/// The long-lived accept loop feeding both protocol paths.
pub struct DispatchLoop {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl DispatchLoop {
    /// Bind the shared socket. A bind failure is fatal to startup.
    pub async fn bind(addr: &str) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            ListenerError::Bind {
                addr: addr.to_string(),
                source,
            }
        })?;
        let local_addr = listener.local_addr().map_err(|source| {
            ListenerError::Bind {
                addr: addr.to_string(),
                source,
            }
        })?;

        tracing::info!(address = %local_addr, "listener bound");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The actual bound address (resolves port 0 to the assigned port).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the accept loop until shutdown or a fatal accept error.
    ///
    /// Each accepted connection is moved into its own task before the loop
    /// touches the socket again, so per-connection work can never stall
    /// admission. Consumes the `BridgeSender`: when the loop exits, the last
    /// sender drops and the bridged listener observes closure.
    pub async fn run(
        self,
        tls_queue: BridgeSender,
        sniff_timeout: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("dispatch loop stopping on shutdown signal");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) if is_transient_accept_error(&e) => {
                    tracing::warn!(error = %e, "transient accept error");
                    continue;
                }
                Err(e) if is_fd_exhaustion(&e) => {
                    tracing::warn!(error = %e, "file descriptors exhausted, backing off");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "fatal accept error, dispatch loop terminating");
                    return Err(ListenerError::Accept(e));
                }
            };

            let queue = tls_queue.clone();
            tokio::spawn(handle_connection(stream, peer, queue, sniff_timeout));
        }
    }
}

/// Classify one connection and route it to its terminal path.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    tls_queue: BridgeSender,
    sniff_timeout: Duration,
) {
    let mut conn = PeekStream::new(stream);

    // Classification failures end here: drop the stream, closing the socket.
    let protocol = match timeout(sniff_timeout, sniff::classify(&mut conn)).await {
        Ok(Ok(protocol)) => protocol,
        Ok(Err(e)) => {
            tracing::debug!(peer_addr = %peer, error = %e, "classification failed, closing");
            return;
        }
        Err(_) => {
            tracing::debug!(peer_addr = %peer, "no data within sniff timeout, closing");
            return;
        }
    };

    match protocol {
        Protocol::Tls => {
            tracing::trace!(peer_addr = %peer, "TLS preface, queueing for handshake");
            tls_queue.dispatch(conn, peer);
        }
        Protocol::Plain => {
            tracing::trace!(peer_addr = %peer, "plaintext, redirecting to https");
            if let Err(e) = redirect::respond_redirect(conn).await {
                tracing::debug!(peer_addr = %peer, error = %e, "redirect not sent");
            }
        }
    }
}
