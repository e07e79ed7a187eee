//! Stop signalling between a `ServerHandle` and its serving task.
//!
//! ```text
//! StopSignal ──── stop requested ───▶ ServingTask
//!     ◀────────── stopped ───────────
//! ```
//!
//! The serving task reports `stopped` when it is dropped, so a task that ends
//! early or panics is still observed as stopped. Dropping every `StopSignal`
//! counts as a stop request.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Handle side: request a stop, wait for the task to finish.
#[derive(Debug, Clone)]
pub struct StopSignal {
    requested: Arc<watch::Sender<bool>>,
    stopped: watch::Receiver<bool>,
}

/// Task side: observe stop requests, report completion on drop.
#[derive(Debug)]
pub struct ServingTask {
    requested: watch::Receiver<bool>,
    stopped: watch::Sender<bool>,
}

/// Create a connected signal/task pair.
pub fn stop_signal() -> (StopSignal, ServingTask) {
    let (requested_tx, requested_rx) = watch::channel(false);
    let (stopped_tx, stopped_rx) = watch::channel(false);
    (
        StopSignal {
            requested: Arc::new(requested_tx),
            stopped: stopped_rx,
        },
        ServingTask {
            requested: requested_rx,
            stopped: stopped_tx,
        },
    )
}

impl StopSignal {
    /// Ask the serving task to stop. Idempotent.
    pub fn request(&self) {
        self.requested.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Resolve once the serving task has finished.
    pub async fn stopped(&self) {
        let mut stopped = self.stopped.clone();
        let _ = stopped.wait_for(|done| *done).await;
    }
}

impl ServingTask {
    /// Future resolving on the first stop request.
    pub fn requested(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut requested = self.requested.clone();
        async move {
            let _ = requested.wait_for(|stop| *stop).await;
        }
    }
}

impl Drop for ServingTask {
    fn drop(&mut self) {
        self.stopped.send_replace(true);
    }
}
