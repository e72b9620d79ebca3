//! Protocol sniffing on the first byte of a connection.
//!
//! A TLS connection opens with a handshake record whose first byte is 0x16;
//! plaintext HTTP starts with an ASCII method ('G', 'P', 'D', ...). One byte
//! is enough to tell them apart, and the peek leaves it in place for the
//! downstream consumer.

use std::io;

use thiserror::Error;
use tokio::io::AsyncRead;

use crate::net::peek::PeekStream;

/// Leading byte of a TLS handshake record.
pub const TLS_HANDSHAKE_BYTE: u8 = 0x16;

/// What a new connection appears to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Looks like a TLS handshake; hand to the secure-transport engine.
    Tls,
    /// Anything else; treat as plaintext HTTP and redirect.
    Plain,
}

/// Error type for classification.
///
/// Policy on failure: the caller closes the connection and takes no further
/// action: no retry, no propagation past the per-connection task.
#[derive(Debug, Error)]
pub enum SniffError {
    #[error("failed to peek connection preface: {0}")]
    Peek(#[from] io::Error),
}

/// Classify a connection by peeking at its first byte.
///
/// The byte stays buffered in the stream, so whichever consumer the caller
/// picks next sees the stream from its very first byte.
pub async fn classify<S>(stream: &mut PeekStream<S>) -> Result<Protocol, SniffError>
where
    S: AsyncRead + Unpin,
{
    let prefix = stream.peek(1).await?;
    if prefix[0] == TLS_HANDSHAKE_BYTE {
        Ok(Protocol::Tls)
    } else {
        Ok(Protocol::Plain)
    }
}
