//! # Startup sequencer: all-or-nothing start.
//!
//! Runs on the supervisor, strictly in order:
//! ```text
//! [display enabled?] ──yes──► launch(display) ──► await display ready ──┐
//!        │ no                                                           │
//!        └──────────────────────────────────────────────────────────────┤
//!                                                                       ▼
//!                             launch(ingestion) ──► await ingestion ready
//!                                                                       ▼
//!                                         begin.notify() ──► publish BeginReleased
//! ```
//!
//! ## Rules
//! - The begin gate is opened only after every launched worker is ready.
//! - A worker that exits before signaling readiness aborts startup: the
//!   begin gate stays closed and [`Startup::Aborted`] is returned.
//! - Readiness waits have no timeout. A hung setup keeps the sequencer
//!   waiting; only a shutdown request (handled by the caller) ends it.

use std::sync::Arc;

use crate::core::Config;
use crate::error::RuntimeError;
use crate::events::{Event, EventKind};
use crate::sync::Gate;
use crate::system::System;
use crate::workers::{PipelineSpec, Shared, WorkerHandle, WorkerKind, launch};

/// How startup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Startup {
    /// Every enabled worker was ready; the begin gate is open.
    Released,
    /// The given worker exited before it became ready.
    Aborted(WorkerKind),
}

/// Launches the enabled workers one after another and releases the begin gate.
///
/// Launched workers are pushed to `handles` as soon as they exist, so the
/// caller keeps track of them even if this future is dropped mid-startup.
pub(crate) async fn run<S: System>(
    cfg: &Config,
    spec: PipelineSpec<S>,
    shared: &Shared<S>,
    handles: &mut Vec<WorkerHandle>,
) -> Result<Startup, RuntimeError> {
    let PipelineSpec { ingestion, display } = spec;
    let display = display.filter(|_| !cfg.headless);

    let order = display
        .map(|w| (WorkerKind::Display, w))
        .into_iter()
        .chain(std::iter::once((WorkerKind::Ingestion, ingestion)));

    for (kind, worker) in order {
        let handle = launch(kind, worker, shared)?;
        let ready = Arc::clone(handle.ready_gate());
        let exited = Arc::clone(handle.exit_gate());
        let name = handle.name().to_string();
        handles.push(handle);

        if !await_ready(&ready, &exited).await {
            shared
                .bus
                .publish(Event::new(EventKind::StartupAborted).with_worker(name));
            return Ok(Startup::Aborted(kind));
        }
    }

    if shared.begin.notify() {
        shared.bus.publish(Event::new(EventKind::BeginReleased));
    }
    Ok(Startup::Released)
}

/// Resolves `true` once the worker is ready, `false` if it exited first.
async fn await_ready(ready: &Gate, exited: &Gate) -> bool {
    tokio::select! {
        biased;
        _ = ready.signaled() => true,
        // A worker may signal readiness and exit right away.
        _ = exited.signaled() => ready.is_signaled(),
    }
}
