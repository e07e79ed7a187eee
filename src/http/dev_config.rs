//! Derived dev server configuration.
//!
//! Built once from `ServerOptions` and the registered proxy table, then handed
//! to `HttpServer`. Nothing mutates it afterwards.

use std::path::{Path, PathBuf};

use crate::config::ServerOptions;
use crate::routing::ProxyTable;

/// Single-page-app fallback settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryFallback {
    /// Also fall back for paths whose last segment contains a dot.
    pub disable_dot_rule: bool,
}

#[derive(Debug, Clone)]
pub struct DevServerConfig {
    pub tls: bool,
    pub compress: bool,
    /// Suppress per-request logging.
    pub quiet: bool,
    /// Live reload: client script injection plus the reload socket.
    pub hot: bool,
    pub content_base: PathBuf,
    pub watch_content_base: bool,
    /// Path component excluded from content watching.
    pub watch_ignored: String,
    pub history_api_fallback: HistoryFallback,
    pub public_path: String,
    pub proxy: ProxyTable,
}

impl DevServerConfig {
    pub fn new(cwd: &Path, options: &ServerOptions, proxy: ProxyTable) -> Self {
        Self {
            tls: options.is_https(),
            compress: true,
            quiet: true,
            hot: true,
            content_base: cwd.join(&options.content_dir),
            watch_content_base: true,
            watch_ignored: "node_modules".to_string(),
            history_api_fallback: HistoryFallback {
                disable_dot_rule: true,
            },
            public_path: normalize_public_path(proxy.public_path()),
            proxy,
        }
    }
}

/// `assets` → `/assets/`, empty → `/`.
fn normalize_public_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
