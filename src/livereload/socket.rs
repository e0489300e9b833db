//! WebSocket endpoint and client library endpoint.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::header,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::lifecycle::Shutdown;
use crate::livereload::channel::{LiveReload, ReloadEvent};

/// The browser client library.
pub const CLIENT_SCRIPT: &str = include_str!("../../assets/livereload.js");

/// State shared by the live-reload endpoints.
#[derive(Clone)]
pub struct LiveReloadState {
    pub channel: Arc<LiveReload>,
    pub shutdown: Arc<Shutdown>,
}

/// `GET <client_path>`: serve the client library.
pub async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        CLIENT_SCRIPT,
    )
}

/// `GET <endpoint>`: upgrade to a live-reload socket.
pub async fn live_reload_socket(
    State(state): State<LiveReloadState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_client(state, socket))
}

async fn serve_client(state: LiveReloadState, socket: WebSocket) {
    let id = Uuid::new_v4();
    let mut events = state.channel.subscribe();
    let mut shutdown = state.shutdown.subscribe();
    state.channel.client_connected(id);

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            event = events.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(client = %id, skipped, "Client lagged; refreshing");
                        ReloadEvent::Refresh
                    }
                    Err(RecvError::Closed) => break,
                };
                let frame = match event.to_frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(client = %id, error = %e, "Failed to encode reload event");
                        continue;
                    }
                };
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = shutdown.recv() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }

    state.channel.client_disconnected(id);
}
