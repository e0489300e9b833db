//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (before or during serving):
//!     (handler, route spec)
//!     → matcher.rs (parse spec, compile regex once)
//!     → registry.rs (append entry, snapshot swap)
//!
//! Incoming request path:
//!     → registry.rs (filter entries by compiled matcher)
//!     → Return: matched entries in registration order
//! ```
//!
//! # Design Decisions
//! - Specs compile at registration; a bad pattern fails the registration call
//! - Entries are never removed or reordered
//! - Every matching entry is returned, not just the first

pub mod matcher;
pub mod registry;

pub use matcher::{RouteCompilationError, RouteMatcher, RouteSpec, MATCH_ALL};
pub use registry::{MiddlewareEntry, MiddlewareRegistry};
