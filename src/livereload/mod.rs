//! Live-reload subsystem.
//!
//! # Data Flow
//! ```text
//! Browser loads injected page
//!     → GET client_path (socket.rs serves the JS client)
//!     → WebSocket upgrade on endpoint (socket.rs)
//!     → channel.rs: subscribe, then record connection
//!         first connection ever → broadcast refresh
//!
//! Reload trigger (host app, SIGHUP, or watcher.rs):
//!     → channel.rs broadcast_reload()
//!     → every socket task sends {"event":"refresh"}
//!     → client reloads the page
//! ```
//!
//! # Design Decisions
//! - One Tokio broadcast channel fans out to all socket tasks
//! - The first-connection flag is owned by the channel and never reset
//! - A lagging client gets a refresh rather than an error

pub mod channel;
pub mod socket;
pub mod watcher;

pub use channel::{LiveReload, ReloadEvent};
pub use socket::{LiveReloadState, CLIENT_SCRIPT};
pub use watcher::SiteWatcher;
