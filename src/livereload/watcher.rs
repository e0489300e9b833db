//! Site directory watcher that triggers reloads.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::livereload::channel::LiveReload;

/// Watches the site root and broadcasts a reload after changes settle.
pub struct SiteWatcher {
    path: PathBuf,
    debounce: Duration,
    channel: Arc<LiveReload>,
}

impl SiteWatcher {
    pub fn new(path: &Path, debounce: Duration, channel: Arc<LiveReload>) -> Self {
        Self {
            path: path.to_path_buf(),
            debounce,
            channel,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default(),
        )?;

        watcher.watch(&self.path, RecursiveMode::Recursive)?;
        tracing::info!(path = ?self.path, "Site watcher started");

        tokio::spawn(debounce_loop(rx, self.debounce, self.channel));
        Ok(watcher)
    }
}

/// Collapse bursts of change notifications into one reload.
async fn debounce_loop(mut rx: mpsc::UnboundedReceiver<()>, window: Duration, channel: Arc<LiveReload>) {
    while rx.recv().await.is_some() {
        tokio::time::sleep(window).await;
        while rx.try_recv().is_ok() {}
        tracing::info!("Site changed, reloading clients");
        channel.broadcast_reload();
    }
}
