//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::mime::MimeType;

/// Root configuration for the dev server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind (e.g. "localhost", "0.0.0.0").
    pub host: String,

    /// Port to bind. 0 picks an ephemeral port.
    pub port: u16,

    /// Directory the site is served from.
    pub root_directory: String,

    /// Prefix removed from both the root directory and the request path.
    pub subfolder: Option<String>,

    /// JSON file replacing the bundled MIME list.
    pub mime_types_file: Option<PathBuf>,

    /// Extensions merged into the base MIME list by `type`.
    pub additional_mime_types: Vec<MimeType>,

    /// Largest request body buffered for middleware, in bytes.
    pub max_body_bytes: usize,

    /// How long `stop` waits for in-flight requests, in seconds.
    pub shutdown_grace_secs: u64,

    /// Live-reload settings.
    pub live_reload: LiveReloadConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 62295,
            root_directory: "site".to_string(),
            subfolder: None,
            mime_types_file: None,
            additional_mime_types: Vec::new(),
            max_body_bytes: 16 * 1024 * 1024,
            shutdown_grace_secs: 5,
            live_reload: LiveReloadConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Live-reload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Inject the client scripts into served HTML.
    pub inject: bool,

    /// WebSocket path.
    pub endpoint: String,

    /// Path the client library is served from.
    pub client_path: String,

    /// Watch the root directory and reload on change.
    pub watch: bool,

    /// Quiet period before a watched change is broadcast.
    pub debounce_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            inject: true,
            endpoint: "/__livereload".to_string(),
            client_path: "/__livereload/client.js".to_string(),
            watch: false,
            debounce_ms: 150,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
