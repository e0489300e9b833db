//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! devserve.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable once the server starts)
//!
//! CLI flags override file values before validation.
//! Middleware handlers are code, not config: they are registered on the
//! server directly or passed in as MiddlewareConfig.
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file (or no file) is valid
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{LiveReloadConfig, LogFormat, ObservabilityConfig, ServerConfig};
pub use validation::{validate_config, ValidationError};
