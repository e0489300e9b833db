//! Reload broadcast state.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the broadcast buffer. Slow clients that fall further
/// behind than this receive a refresh anyway.
const EVENT_BUFFER: usize = 16;

/// Events pushed to browser clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ReloadEvent {
    /// Reload the page now.
    Refresh,
}

impl ReloadEvent {
    /// Text frame sent over the socket, e.g. `{"event":"refresh"}`.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The live-reload push channel.
///
/// Owns the "has any client connected before" flag: the very first
/// connection triggers a refresh broadcast, later ones are only logged.
#[derive(Debug)]
pub struct LiveReload {
    tx: broadcast::Sender<ReloadEvent>,
    has_connected: AtomicBool,
    clients: AtomicUsize,
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            tx,
            has_connected: AtomicBool::new(false),
            clients: AtomicUsize::new(0),
        }
    }

    /// Receiver for events broadcast after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// Send a refresh to every connected client. Returns how many were reached.
    pub fn broadcast_reload(&self) -> usize {
        let reached = self.tx.send(ReloadEvent::Refresh).unwrap_or(0);
        tracing::debug!(clients = reached, "Broadcast reload");
        reached
    }

    /// Record a new client. The caller must already hold a subscription so
    /// the first-connection refresh reaches it.
    ///
    /// Returns true if this was the first connection ever and a refresh was broadcast.
    pub fn client_connected(&self, id: Uuid) -> bool {
        let clients = self.clients.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.has_connected.swap(true, Ordering::SeqCst) {
            tracing::info!(client = %id, "First live-reload client connected; refreshing");
            self.broadcast_reload();
            true
        } else {
            tracing::info!(client = %id, clients, "Live-reload client connected");
            false
        }
    }

    pub fn client_disconnected(&self, id: Uuid) {
        let clients = self.clients.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        tracing::info!(client = %id, clients, "Live-reload client disconnected");
    }

    /// Clients currently attached.
    pub fn connected_clients(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }

    pub fn has_connected(&self) -> bool {
        self.has_connected.load(Ordering::SeqCst)
    }
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}
