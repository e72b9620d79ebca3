//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags (clap) + optional TOML file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared by value into the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload in this subsystem
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks and runs
//!   before any socket is bound

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, ServerConfig, TimeoutConfig, TlsConfig};
pub use validation::{validate_config, ValidationError};
