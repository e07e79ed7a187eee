//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load rules → Compile → Register → Bind → Serve → emit server.start
//!
//! Shutdown (shutdown.rs):
//!     ServerHandle::shutdown → StopSignal → Stop accepting → Drain → stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → pipeline triggers shutdown
//! ```
//!
//! # Design Decisions
//! - Explicit PipelineContext (cwd + event bus) instead of ambient globals
//! - Exactly one lifecycle event per start attempt
//! - Browser launching behind a trait so callers and tests can replace it

pub mod browser;
pub mod events;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use browser::{BrowserOpener, SystemBrowser};
pub use events::{EventBus, PipelineContext, PipelineEvent};
pub use shutdown::{stop_signal, ServingTask, StopSignal};
pub use startup::{DevServer, DevServerError, ServerHandle, ServerState};
