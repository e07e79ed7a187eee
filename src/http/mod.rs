//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → /__devserve/* → livereload.rs (socket, client script)
//!     → routes mounted by the pipeline's `before` hook
//!     → ProxyTable match → proxy.rs (forward upstream, response hook)
//!     → otherwise → static_files.rs (content base, history fallback)
//!     → Send to client
//! ```

pub mod dev_config;
pub mod livereload;
pub mod proxy;
pub mod server;
pub mod static_files;

pub use dev_config::{DevServerConfig, HistoryFallback};
pub use livereload::Reloader;
pub use server::{AppState, BeforeHook, HttpServer};
