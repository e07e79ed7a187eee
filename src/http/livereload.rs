//! Live reload for browsers viewing the dev server.
//!
//! # Data Flow
//! ```text
//! content_base file change
//!     → ContentWatcher (notify)
//!     → Reloader::notify (broadcast)
//!     → every /__devserve/ws session sends "reload"
//!     → client.js calls location.reload()
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::header,
    response::{IntoResponse, Response},
};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;

pub const SOCKET_PATH: &str = "/__devserve/ws";
pub const CLIENT_SCRIPT_PATH: &str = "/__devserve/client.js";

const CLIENT_SCRIPT: &str = r#"(function () {
  var scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var socket = new WebSocket(scheme + location.host + '/__devserve/ws');
  socket.onmessage = function (event) {
    if (event.data === 'reload') {
      location.reload();
    }
  };
})();
"#;

/// Fan-out of reload signals to connected browsers.
#[derive(Debug, Clone)]
pub struct Reloader {
    tx: broadcast::Sender<()>,
}

impl Reloader {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Ask every connected browser to reload.
    pub fn notify(&self) {
        let _ = self.tx.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Number of connected sessions.
    pub fn session_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Reloader {
    fn default() -> Self {
        Self::new()
    }
}

/// Watches the content base and triggers reloads on change.
pub struct ContentWatcher {
    path: PathBuf,
    ignored: String,
    reloader: Reloader,
}

impl ContentWatcher {
    pub fn new(path: &Path, ignored: impl Into<String>, reloader: Reloader) -> Self {
        Self {
            path: path.to_path_buf(),
            ignored: ignored.into(),
            reloader,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let reloader = self.reloader.clone();
        let ignored = self.ignored.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
                        return;
                    }
                    if event.paths.iter().all(|p| is_ignored(p, &ignored)) {
                        return;
                    }
                    tracing::debug!(paths = ?event.paths, "Content change detected, reloading clients");
                    reloader.notify();
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::Recursive)?;

        tracing::info!(path = ?self.path, "Content watcher started");
        Ok(watcher)
    }
}

fn is_ignored(path: &Path, ignored: &str) -> bool {
    path.components().any(|c| c.as_os_str() == ignored)
}

/// Upgrade to the reload socket.
pub async fn socket_handler(ws: WebSocketUpgrade, State(reloader): State<Reloader>) -> Response {
    let rx = reloader.subscribe();
    ws.on_upgrade(move |socket| session(socket, rx))
}

async fn session(mut socket: WebSocket, mut rx: broadcast::Receiver<()>) {
    loop {
        tokio::select! {
            signal = rx.recv() => match signal {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if socket.send(Message::Text("reload".into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::debug!("Live reload session closed");
}

/// The browser side of live reload.
pub async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_SCRIPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignored_paths() {
        assert!(is_ignored(Path::new("/p/build/node_modules/x.js"), "node_modules"));
        assert!(!is_ignored(Path::new("/p/build/app.js"), "node_modules"));
        assert!(!is_ignored(Path::new("/p/build/node_modules_backup.js"), "node_modules"));
    }

    #[tokio::test]
    async fn test_reloader_fan_out() {
        let reloader = Reloader::new();
        let mut a = reloader.subscribe();
        let mut b = reloader.subscribe();
        assert_eq!(reloader.session_count(), 2);

        reloader.notify();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn test_client_script_targets_socket() {
        assert!(CLIENT_SCRIPT.contains(SOCKET_PATH));
    }
}
