//! Plaintext-to-HTTPS redirect responder.
//!
//! # Responsibilities
//! - Read exactly one request head (request line + headers, no body)
//! - Answer with `301 Moved Permanently` pointing at the https:// equivalent,
//!   preserving path and query verbatim
//! - Close the connection on every path, success or failure
//!
//! # Design Decisions
//! - Hand-formatted response bytes instead of an HTTP stack: the responder
//!   owns a raw stream, writes a fixed head, and never reuses the connection
//! - Malformed input gets no response at all, only a closed socket

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::net::peek::PeekStream;

/// Upper bound on the request head. Anything larger is not a redirect
/// candidate worth buffering.
const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Error type for the redirect path. Every variant ends with the connection
/// closed and nothing written.
#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("i/o error while reading request head: {0}")]
    Io(#[from] io::Error),

    #[error("request head exceeds {MAX_HEAD_BYTES} bytes")]
    HeadTooLarge,

    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("missing Host header")]
    MissingHost,
}

/// Consume a plaintext connection: read one request, write a 301 redirect to
/// the `https://` equivalent URL, close.
///
/// Takes the stream by value so the socket is closed on every exit path,
/// exactly once, whether or not the response was written.
pub async fn respond_redirect<S>(mut stream: PeekStream<S>) -> Result<(), RedirectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let head = read_head(&mut stream).await?;
    let (target, host) = parse_head(&head)?;

    let location = format!("https://{host}{target}");
    let response = format!(
        "HTTP/1.1 301 Moved Permanently\r\n\
         Location: {location}\r\n\
         Connection: close\r\n\
         \r\n"
    );

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Read up to and including the head terminator (CRLFCRLF), capped.
async fn read_head<S>(stream: &mut PeekStream<S>) -> Result<Vec<u8>, RedirectError>
where
    S: AsyncRead + Unpin,
{
    let mut head = Vec::with_capacity(512);
    let mut chunk = [0u8; 512];
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Err(RedirectError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "peer closed before completing the request head",
            )));
        }
        head.extend_from_slice(&chunk[..read]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            return Ok(head);
        }
        if head.len() > MAX_HEAD_BYTES {
            return Err(RedirectError::HeadTooLarge);
        }
    }
}

/// Extract the request-target and Host header value from a request head.
fn parse_head(head: &[u8]) -> Result<(&str, &str), RedirectError> {
    let mut lines = head.split(|b| *b == b'\n');

    let request_line = lines.next().ok_or(RedirectError::MalformedRequestLine)?;
    let request_line = std::str::from_utf8(request_line)
        .map_err(|_| RedirectError::MalformedRequestLine)?
        .trim_end_matches('\r');

    // "METHOD SP request-target SP HTTP-version", nothing more, nothing less.
    let mut parts = request_line.split(' ');
    let method = parts.next().ok_or(RedirectError::MalformedRequestLine)?;
    let target = parts.next().ok_or(RedirectError::MalformedRequestLine)?;
    let version = parts.next().ok_or(RedirectError::MalformedRequestLine)?;
    if method.is_empty()
        || target.is_empty()
        || !version.starts_with("HTTP/")
        || parts.next().is_some()
    {
        return Err(RedirectError::MalformedRequestLine);
    }

    for line in lines {
        let line = std::str::from_utf8(line)
            .map_err(|_| RedirectError::MalformedRequestLine)?
            .trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("host") {
                let host = value.trim();
                if host.is_empty() {
                    return Err(RedirectError::MissingHost);
                }
                return Ok((target, host));
            }
        }
    }

    Err(RedirectError::MissingHost)
}
