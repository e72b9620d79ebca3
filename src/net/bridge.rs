//! Channel-backed synthetic listener for classified TLS connections.
//!
//! # Data Flow
//! ```text
//! per-connection tasks ──dispatch()──▶ bounded mpsc ──accept()──▶ TLS engine
//! ```
//!
//! # Design Decisions
//! - The queue is bounded; a full queue drops (closes) the new connection
//!   instead of ever blocking a dispatch task
//! - Closing works from both ends: dropping every `BridgeSender` closes the
//!   channel and unblocks a waiting `accept()`, and `close()` on the listener
//!   rejects further enqueues and drains what is already queued
//! - FIFO, multi-producer, single-consumer

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::net::peek::PeekStream;

/// A classified-TLS connection waiting for the secure-transport engine,
/// with its peer address.
pub type BridgedConn = (PeekStream<TcpStream>, SocketAddr);

/// Error type for the bridged listener.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The bridge is closed and drained; no more connections will arrive.
    #[error("bridged listener closed")]
    Closed,
}

/// Producer half: held (cloned) by the per-connection dispatch tasks.
#[derive(Debug, Clone)]
pub struct BridgeSender {
    tx: mpsc::Sender<BridgedConn>,
}

impl BridgeSender {
    /// Queue a connection for the TLS engine. Never blocks: on a full queue
    /// or a closed bridge the connection is dropped, which closes the socket.
    pub fn dispatch(&self, conn: PeekStream<TcpStream>, peer: SocketAddr) {
        match self.tx.try_send((conn, peer)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(peer_addr = %peer, "pending TLS queue full, dropping connection");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(peer_addr = %peer, "bridge closed, dropping connection");
            }
        }
    }
}

/// Consumer half: satisfies the accept-contract of a real listener while its
/// connections come from the queue instead of the operating system.
#[derive(Debug)]
pub struct BridgedListener {
    rx: mpsc::Receiver<BridgedConn>,
    local_addr: SocketAddr,
}

impl BridgedListener {
    /// Wait for the next queued connection.
    ///
    /// Blocks while the bridge is open and empty; returns
    /// `Err(BridgeError::Closed)` once every sender is gone (or `close` was
    /// called) and the queue is drained.
    pub async fn accept(&mut self) -> Result<BridgedConn, BridgeError> {
        self.rx.recv().await.ok_or(BridgeError::Closed)
    }

    /// Close the listener: reject further enqueues and drop (close) every
    /// connection already queued. Subsequent `accept` calls return
    /// `Err(BridgeError::Closed)` immediately.
    pub fn close(&mut self) {
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }

    /// The bind address this listener logically serves, identical to the
    /// raw acceptor's, since both represent the same port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Build a bridge over a bounded queue of `capacity` pending connections.
pub fn bridge(local_addr: SocketAddr, capacity: usize) -> (BridgeSender, BridgedListener) {
    let (tx, rx) = mpsc::channel(capacity);
    (BridgeSender { tx }, BridgedListener { rx, local_addr })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:4443".parse().unwrap()
    }

    async fn connected_pair(listener: &tokio::net::TcpListener) -> (TcpStream, SocketAddr) {
        let client = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        let (server, _) = listener.accept().await.unwrap();
        drop(client);
        let peer = server.peer_addr().unwrap();
        (server, peer)
    }

    #[tokio::test]
    async fn connections_come_out_in_fifo_order() {
        let tcp = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, mut listener) = bridge(addr(), 8);

        let mut peers = Vec::new();
        for _ in 0..3 {
            let (stream, peer) = connected_pair(&tcp).await;
            peers.push(peer);
            tx.dispatch(PeekStream::new(stream), peer);
        }

        for expected in peers {
            let (_, peer) = listener.accept().await.unwrap();
            assert_eq!(peer, expected);
        }
    }

    #[tokio::test]
    async fn accept_unblocks_when_all_senders_drop() {
        let (tx, mut listener) = bridge(addr(), 8);
        let task = tokio::spawn(async move { listener.accept().await });

        drop(tx);
        assert!(matches!(task.await.unwrap(), Err(BridgeError::Closed)));
    }

    #[tokio::test]
    async fn close_rejects_enqueues_and_drains() {
        let tcp = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, mut listener) = bridge(addr(), 8);

        let (stream, peer) = connected_pair(&tcp).await;
        tx.dispatch(PeekStream::new(stream), peer);

        listener.close();
        assert!(matches!(listener.accept().await, Err(BridgeError::Closed)));

        // Enqueue after close must not block and must not be observable.
        let (stream, peer) = connected_pair(&tcp).await;
        tx.dispatch(PeekStream::new(stream), peer);
        assert!(matches!(listener.accept().await, Err(BridgeError::Closed)));
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let tcp = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, mut listener) = bridge(addr(), 1);

        let (first, first_peer) = connected_pair(&tcp).await;
        let (second, second_peer) = connected_pair(&tcp).await;
        tx.dispatch(PeekStream::new(first), first_peer);
        // Queue is full; this returns immediately and drops the stream.
        tx.dispatch(PeekStream::new(second), second_peer);

        let (_, peer) = listener.accept().await.unwrap();
        assert_eq!(peer, first_peer);
    }

    #[tokio::test]
    async fn dropped_connections_are_closed_for_their_peers() {
        use tokio::io::AsyncReadExt;

        let tcp = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, mut listener) = bridge(addr(), 1);
        let mut sink = [0u8; 1];

        let mut queued_client = TcpStream::connect(tcp.local_addr().unwrap())
            .await
            .unwrap();
        let (queued, _) = tcp.accept().await.unwrap();
        let peer = queued.peer_addr().unwrap();
        tx.dispatch(PeekStream::new(queued), peer);

        // Overflow: the queue is full, so this dispatch drops the stream and
        // its peer must observe a closed socket, not a half-open one.
        let mut overflow_client = TcpStream::connect(tcp.local_addr().unwrap())
            .await
            .unwrap();
        let (overflow, _) = tcp.accept().await.unwrap();
        let peer = overflow.peer_addr().unwrap();
        tx.dispatch(PeekStream::new(overflow), peer);
        assert_eq!(overflow_client.read(&mut sink).await.unwrap(), 0);

        // Closing the listener drains the queue; the queued peer sees EOF.
        listener.close();
        assert_eq!(queued_client.read(&mut sink).await.unwrap(), 0);

        // Dispatch after close drops the stream the same way.
        let mut late_client = TcpStream::connect(tcp.local_addr().unwrap())
            .await
            .unwrap();
        let (late, _) = tcp.accept().await.unwrap();
        let peer = late.peer_addr().unwrap();
        tx.dispatch(PeekStream::new(late), peer);
        assert_eq!(late_client.read(&mut sink).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn local_addr_is_the_shared_bind_point() {
        let (_tx, listener) = bridge(addr(), 1);
        assert_eq!(listener.local_addr(), addr());
    }
}
