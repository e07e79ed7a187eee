//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied request:
//!     → headers.rs (strip hop-by-hop, drop Host)
//!     → upstream
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → route response hook (CORS)
//! ```

pub mod headers;
