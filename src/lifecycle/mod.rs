//! Lifecycle management: startup ordering and shutdown coordination.

pub mod shutdown;

pub use shutdown::Shutdown;
