//! HTTP request handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request ID + trace layers)
//!     → live-reload routes (socket, client script)   [exact paths]
//!     → dispatcher.rs                                 [everything else]
//!         → routing registry: matching middleware, in order
//!         → middleware.rs contract: send / proceed / fail
//!         → on fallthrough: static_files.rs
//!             → inject.rs for HTML
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod inject;
pub mod middleware;
pub mod server;
pub mod static_files;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use inject::{HtmlInjector, InjectionError};
pub use middleware::{IncomingRequest, Middleware, MiddlewareError, MiddlewareResult, Next, ResponseWriter};
pub use server::{DevServer, MiddlewareConfig, ServerError, ServerHandle};
pub use static_files::{ServeError, StaticResolver};
