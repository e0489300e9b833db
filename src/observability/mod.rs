//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit `tracing` events with structured fields
//!     → logging.rs (subscriber: env filter + fmt layer)
//!     → stdout (pretty or JSON lines)
//!
//! HTTP access logs come from tower-http's TraceLayer; each request
//! carries an x-request-id that is echoed back on the response.
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber; the binary (or host app) does
//! - RUST_LOG overrides the configured level

pub mod logging;

pub use logging::init_logging;
