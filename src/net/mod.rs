//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! host:port
//!     → listener.rs (bind, report conflicts)
//!     → tls.rs (optional rustls acceptor config)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Binding happens before the server task is spawned so failures surface
//!   synchronously to the caller
//! - TLS is optional and handled transparently

pub mod listener;
pub mod tls;

pub use listener::{bind, ListenerError};
pub use tls::{tls_config, TlsError};
