//! Pipeline context and lifecycle events.
//!
//! The invoking pipeline subscribes to the event bus before starting the dev
//! server; the bootstrapper publishes exactly one of `ServerStart` or
//! `ServerFailed` per run. Routes the pipeline wants served go through the
//! `before` hook instead of an event, since they must exist before binding.

use std::fmt;
use std::path::PathBuf;

use axum::Router;
use tokio::sync::broadcast;

use crate::http::{AppState, BeforeHook};
use crate::lifecycle::startup::ServerHandle;

/// Lifecycle notifications published to the pipeline.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The server is listening.
    ServerStart(ServerHandle),
    /// Startup aborted.
    ServerFailed(String),
}

impl PipelineEvent {
    /// Stable event name, e.g. `server.start`.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::ServerStart(_) => "server.start",
            PipelineEvent::ServerFailed(_) => "server.failed",
        }
    }
}

/// Broadcast channel of pipeline events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: PipelineEvent) {
        tracing::debug!(event = event.name(), "Emitting pipeline event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Services a pipeline stage receives from its caller.
#[derive(Clone)]
pub struct PipelineContext {
    /// Project root: `server.yml` and the content directory resolve against it.
    pub cwd: PathBuf,
    pub events: EventBus,
    /// Applied to the router before the proxy and static handlers are attached.
    pub before: Option<BeforeHook>,
}

impl PipelineContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            events: EventBus::new(),
            before: None,
        }
    }

    /// Mount pipeline routes or middleware ahead of the default handlers.
    pub fn with_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(Router<AppState>) -> Router<AppState> + Send + Sync + 'static,
    {
        self.before = Some(std::sync::Arc::new(hook));
        self
    }
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("cwd", &self.cwd)
            .field("events", &self.events)
            .field("before", &self.before.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let ctx = PipelineContext::new("/project");
        let mut rx = ctx.events.subscribe();

        ctx.events.emit(PipelineEvent::ServerFailed("port in use".into()));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "server.failed");
        assert!(matches!(event, PipelineEvent::ServerFailed(msg) if msg == "port in use"));
    }

    #[test]
    fn test_before_hook_is_optional() {
        let ctx = PipelineContext::new("/project");
        assert!(ctx.before.is_none());

        let ctx = ctx.with_before(|router| router);
        assert!(ctx.before.is_some());
    }

    #[test]
    fn test_emit_without_subscribers() {
        EventBus::new().emit(PipelineEvent::ServerFailed("ignored".into()));
    }
}
