//! Live-reload channel tests over real WebSocket connections.

use futures_util::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use devserve::DevServer;

mod common;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: std::net::SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}/__livereload", addr))
        .await
        .expect("live-reload socket unreachable");
    socket
}

/// Next text frame, or None if nothing arrives in time.
async fn next_text(socket: &mut Socket, wait: Duration) -> Option<String> {
    loop {
        let msg = tokio::time::timeout(wait, socket.next()).await.ok()??.ok()?;
        if msg.is_text() {
            return msg.to_text().ok().map(str::to_string);
        }
    }
}

async fn wait_for_clients(server: &DevServer, n: usize) {
    for _ in 0..100 {
        if server.live_reload().connected_clients() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {} live-reload clients", n);
}

#[tokio::test]
async fn test_first_connection_triggers_single_refresh() {
    let dir = common::site();
    let server = DevServer::new(common::config_for(&dir));
    let handle = server.start().await.unwrap();

    let mut first = connect(handle.local_addr()).await;
    assert_eq!(
        next_text(&mut first, Duration::from_secs(2)).await.as_deref(),
        Some(r#"{"event":"refresh"}"#)
    );

    let mut second = connect(handle.local_addr()).await;
    wait_for_clients(&server, 2).await;
    assert_eq!(next_text(&mut second, Duration::from_millis(200)).await, None);
    assert_eq!(next_text(&mut first, Duration::from_millis(200)).await, None);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_broadcast_reaches_all_clients() {
    let dir = common::site();
    let server = DevServer::new(common::config_for(&dir));
    let handle = server.start().await.unwrap();

    let mut a = connect(handle.local_addr()).await;
    // Drain the first-connection refresh.
    assert!(next_text(&mut a, Duration::from_secs(2)).await.is_some());
    let mut b = connect(handle.local_addr()).await;
    wait_for_clients(&server, 2).await;

    assert_eq!(server.broadcast_reload(), 2);
    for socket in [&mut a, &mut b] {
        assert_eq!(
            next_text(socket, Duration::from_secs(2)).await.as_deref(),
            Some(r#"{"event":"refresh"}"#)
        );
    }

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_disconnect_is_tracked() {
    let dir = common::site();
    let server = DevServer::new(common::config_for(&dir));
    let handle = server.start().await.unwrap();

    let mut socket = connect(handle.local_addr()).await;
    wait_for_clients(&server, 1).await;
    socket.close(None).await.unwrap();
    wait_for_clients(&server, 0).await;
    assert!(server.live_reload().has_connected());

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_closes_sockets() {
    let dir = common::site();
    let server = DevServer::new(common::config_for(&dir));
    let handle = server.start().await.unwrap();

    let mut socket = connect(handle.local_addr()).await;
    assert!(next_text(&mut socket, Duration::from_secs(2)).await.is_some());
    handle.stop().await.unwrap();

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(Ok(msg)) = socket.next().await {
            if msg.is_close() {
                return true;
            }
        }
        true
    })
    .await;
    assert!(matches!(closed, Ok(true)));
}
