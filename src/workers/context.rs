//! # Per-thread view of the pipeline handed to a worker.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::sync::Gate;
use crate::system::System;
use crate::workers::WorkerKind;

/// Everything a worker thread needs to take part in the lifecycle.
pub struct WorkerContext<S> {
    pub(crate) kind: WorkerKind,
    pub(crate) name: Arc<str>,
    pub(crate) system: Arc<S>,
    pub(crate) ready: Arc<Gate>,
    pub(crate) begin: Arc<Gate>,
    pub(crate) token: CancellationToken,
    pub(crate) bus: Bus,
}

impl<S: System> WorkerContext<S> {
    /// Role of this worker in the pipeline.
    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    /// Name the worker was launched under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared system object.
    pub fn system(&self) -> &Arc<S> {
        &self.system
    }

    /// Signals that internal setup is complete.
    ///
    /// Opens this worker's readiness gate; the supervisor does not launch the
    /// next worker (or release the begin gate) before this call. Repeated
    /// calls are no-ops.
    pub fn ready(&self) {
        if self.ready.is_signaled() {
            return;
        }
        // Published before the gate opens so it precedes the next launch on the bus.
        self.bus
            .publish(Event::new(EventKind::WorkerReady).with_worker(Arc::clone(&self.name)));
        self.ready.notify();
    }

    /// Blocks until every enabled worker is ready and the supervisor has
    /// released the pipeline.
    ///
    /// There is no timeout: if another worker never becomes ready, this never
    /// returns.
    pub fn wait_begin(&self) {
        self.begin.wait();
    }

    /// True once the begin gate has been opened.
    pub fn is_begun(&self) -> bool {
        self.begin.is_signaled()
    }

    /// True once shutdown was requested. Main loops should poll this.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Shutdown token, for workers that hand it to their own helpers.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
