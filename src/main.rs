//! devserve: serve a site directory with live reload.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser request
//!     ───────────────▶ http::server ──▶ http::dispatcher ──▶ middleware chain
//!                           │                   │
//!                           │                   └─ fallthrough ─▶ http::static_files ─▶ http::inject
//!                           │
//!                           └─ /__livereload ─▶ livereload::socket ◀─ broadcast ─ livereload::channel
//!                                                                                   ▲
//!                                              SIGHUP / livereload::watcher ────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use devserve::config::{load_config, validate_config, ServerConfig};
use devserve::lifecycle::signals::{reload_on_hangup, shutdown_signal};
use devserve::observability::init_logging;
use devserve::DevServer;

#[derive(Parser)]
#[command(name = "devserve")]
#[command(about = "Local development server with live reload", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    port: Option<u16>,

    /// Site directory to serve
    #[arg(short, long)]
    root: Option<String>,

    /// Prefix stripped from the root and request paths
    #[arg(long)]
    subfolder: Option<String>,

    /// Do not inject the live-reload client into HTML
    #[arg(long)]
    no_inject: bool,

    /// Reload browsers when files under the root change
    #[arg(short, long)]
    watch: bool,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(root) = self.root {
            config.root_directory = root;
        }
        if self.subfolder.is_some() {
            config.subfolder = self.subfolder;
        }
        if self.no_inject {
            config.live_reload.inject = false;
        }
        if self.watch {
            config.live_reload.watch = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    cli.apply(&mut config);
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("config: {}", error);
        }
        return Err("invalid configuration".into());
    }

    init_logging(&config.observability)?;
    tracing::info!("devserve v{} starting", env!("CARGO_PKG_VERSION"));

    let server = DevServer::new(config);
    let handle = server.start().await?;
    tracing::info!("Serving on http://{}", handle.local_addr());

    let hangup = tokio::spawn(reload_on_hangup(server.live_reload()));

    shutdown_signal().await;
    hangup.abort();
    handle.stop().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
