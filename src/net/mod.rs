//! Network layer subsystem: the dual-protocol port multiplexer.
//!
//! # Data Flow
//! ```text
//! OS accept (listener.rs)
//!     → one task per connection
//!     → peek.rs  (wrap stream, buffer lookahead bytes)
//!     → sniff.rs (first byte == 0x16 ⇒ TLS, else plaintext)
//!         ├─ plaintext → redirect.rs (read one request head, 301, close)
//!         └─ TLS       → bridge.rs   (FIFO hand-off to the TLS engine)
//! ```
//!
//! # Design Decisions
//! - The accept loop never awaits per-connection work; a slow client cannot
//!   stall admission of new connections
//! - Every connection ends on exactly one terminal path: redirect-and-close
//!   or enqueue-handshake-serve-close
//! - The pending queue is the only shared mutable state; it is bounded and
//!   drops (closes) connections rather than blocking producers

pub mod bridge;
pub mod listener;
pub mod peek;
pub mod redirect;
pub mod sniff;

pub use bridge::{bridge, BridgeError, BridgeSender, BridgedListener};
pub use listener::{DispatchLoop, ListenerError};
pub use peek::PeekStream;
pub use sniff::{classify, Protocol};
