//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (proxy counters and latency)
//! ```

pub mod logging;
pub mod metrics;
