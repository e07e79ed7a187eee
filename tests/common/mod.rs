//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use devserve::lifecycle::BrowserOpener;

/// Start a backend that answers every request with `<name>:<path>`.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 16 * 1024];
                        let mut read = 0;
                        loop {
                            let n = match socket.read(&mut buf[read..]).await {
                                Ok(n) => n,
                                Err(_) => return,
                            };
                            if n == 0 {
                                break;
                            }
                            read += n;
                            if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                                break;
                            }
                        }

                        let head = String::from_utf8_lossy(&buf[..read]).to_string();
                        let path = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("")
                            .to_string();
                        let body = format!("{}:{}", name, path);
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Create a project with `build/index.html`, `build/static/app.js` and an
/// optional `server.yml`.
pub fn project(rules_yaml: Option<&str>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let build = dir.path().join("build");
    fs::create_dir_all(build.join("static")).unwrap();
    fs::write(
        build.join("index.html"),
        "<html><body><div id=\"root\">spa</div></body></html>",
    )
    .unwrap();
    fs::write(build.join("static/app.js"), "console.log('app');").unwrap();

    if let Some(yaml) = rules_yaml {
        write_rules(dir.path(), yaml);
    }
    dir
}

pub fn write_rules(dir: &Path, yaml: &str) {
    fs::write(dir.join("server.yml"), yaml).unwrap();
}

/// HTTP client that ignores system proxies and accepts self-signed certificates.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap()
}

/// Records URLs instead of launching a browser.
#[derive(Default)]
pub struct RecordingBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl BrowserOpener for RecordingBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

impl RecordingBrowser {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}
