//! Local development HTTP server with pattern-scoped middleware and live reload.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod livereload;
pub mod mime;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use http::{DevServer, MiddlewareConfig, ServerHandle};
pub use livereload::LiveReload;
