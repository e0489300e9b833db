//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (http::server):
//!     Load MIME table → Build dispatcher → Bind listener → Serve
//!
//! Stop (shutdown.rs):
//!     trigger() → listener closes, live-reload sockets close
//!     → in-flight requests finish (bounded wait, never aborted)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop
//!     SIGHUP → broadcast a reload to connected browsers
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
