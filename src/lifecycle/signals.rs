//! OS signal handling.
//!
//! SIGINT/SIGTERM stop the server. On Unix, SIGHUP is the manual reload
//! trigger for scripts that rebuild the site outside the process.

use std::sync::Arc;

use crate::livereload::LiveReload;

/// Wait for Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Broadcast a reload every time SIGHUP arrives. Runs until the process exits.
#[cfg(unix)]
pub async fn reload_on_hangup(channel: Arc<LiveReload>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for SIGHUP");
            return;
        }
    };

    while hangup.recv().await.is_some() {
        let reached = channel.broadcast_reload();
        tracing::info!(clients = reached, "SIGHUP received, reloading clients");
    }
}

#[cfg(not(unix))]
pub async fn reload_on_hangup(_channel: Arc<LiveReload>) {}
