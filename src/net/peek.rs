//! Lookahead wrapper for raw byte streams.
//!
//! # Responsibilities
//! - Buffer bytes read ahead of the consumer (`peek`)
//! - Replay buffered bytes transparently, in order, on `read`
//! - Pass writes and shutdown straight through to the inner stream

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

/// A bidirectional stream with non-destructive lookahead.
///
/// Whatever `peek` pulls off the wire stays in an internal buffer and is
/// handed to the next reader first, so downstream consumers (the redirect
/// parser or the TLS handshake) see exactly the bytes the peer sent, once,
/// in original order.
#[derive(Debug)]
pub struct PeekStream<S> {
    inner: S,
    lookahead: Vec<u8>,
}

impl<S> PeekStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lookahead: Vec::new(),
        }
    }

    /// Bytes currently buffered ahead of the read position.
    pub fn buffered(&self) -> usize {
        self.lookahead.len()
    }
}

impl<S: AsyncRead + Unpin> PeekStream<S> {
    /// Return the next `n` bytes without advancing the read position.
    ///
    /// Idempotent: repeated peeks with the same or a smaller `n` before any
    /// read return identical bytes. Fails with `UnexpectedEof` if the peer
    /// closes before `n` bytes arrive. Not time-bounded; callers that cannot
    /// wait forever wrap this in a timeout.
    pub async fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        while self.lookahead.len() < n {
            let mut chunk = [0u8; 512];
            let read = self.inner.read(&mut chunk).await?;
            if read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed before enough bytes arrived to peek",
                ));
            }
            self.lookahead.extend_from_slice(&chunk[..read]);
        }
        Ok(&self.lookahead[..n])
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for PeekStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.lookahead.is_empty() {
            let n = this.lookahead.len().min(buf.remaining());
            buf.put_slice(&this.lookahead[..n]);
            this.lookahead.drain(..n);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for PeekStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }
}
