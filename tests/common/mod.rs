//! Shared utilities for integration tests.

use std::fs;
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::TempDir;

use devserve::{DevServer, ServerConfig};

/// A temp site with an index page, a stylesheet and a nested page.
pub fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("index.html"),
        "<!DOCTYPE html><html><head><title>Home</title></head><body><h1>Home</h1></body></html>",
    )
    .unwrap();
    fs::write(dir.path().join("style.css"), "h1 { color: red; }").unwrap();
    fs::write(dir.path().join("theme.scss"), "$c: red;").unwrap();
    fs::create_dir(dir.path().join("about")).unwrap();
    fs::write(dir.path().join("about/index.html"), "<body>About</body>").unwrap();
    dir
}

/// Config serving `dir` on an ephemeral loopback port.
pub fn config_for(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        root_directory: dir.path().to_string_lossy().into_owned(),
        shutdown_grace_secs: 2,
        ..Default::default()
    }
}

/// Start `server` and return its base URL.
#[allow(dead_code)]
pub async fn start(server: &DevServer) -> (devserve::ServerHandle, String) {
    let handle = server.start().await.unwrap();
    let base = base_url(handle.local_addr());
    (handle, base)
}

#[allow(dead_code)]
pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

/// Plain client without connection pooling so stop() is not held up.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
