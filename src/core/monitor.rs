//! # Lifecycle monitor: finalize the system once either worker terminates.
//!
//! ```text
//! loop {
//!   ├─► any worker done? ── yes ─► Finalizer::claim() ── won ─► publish FinalizeRequested
//!   │                                                      └─► spawn_blocking(system.finalize())
//!   │                                                      └─► publish Finalized
//!   └─► wait: next tick (poll_interval)  |  any worker exit gate opens
//! }
//! ```
//!
//! ## Rules
//! - `finalize()` runs **at most once**: the claim is a compare-and-swap, so
//!   the check and the act cannot interleave with another observer.
//! - `finalize()` never runs while no completion flag is set.
//! - The monitor never returns and never asks the process to exit. After
//!   finalization it keeps ticking until the caller drops it on shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future;
use tokio::time::{self, MissedTickBehavior};

use crate::core::Config;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::panic_message;
use crate::sync::any_set;
use crate::system::System;
use crate::workers::WorkerHandle;

/// One-shot latch guarding `System::finalize`.
#[derive(Debug, Default)]
pub(crate) struct Finalizer {
    claimed: AtomicBool,
}

impl Finalizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for exactly one caller, ever.
    pub(crate) fn claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}

/// Watches the workers' completion flags and finalizes `system` once.
pub(crate) async fn run<S: System>(
    cfg: &Config,
    system: &Arc<S>,
    handles: &[WorkerHandle],
    bus: &Bus,
) {
    let finalizer = Finalizer::new();
    let mut ticker = time::interval(cfg.poll_interval_clamped());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if !finalizer.is_claimed() && any_set(handles.iter().map(|h| h.done_flag())) {
            let trigger = handles
                .iter()
                .find(|h| h.is_done())
                .map_or("unknown", |h| h.name());
            if finalizer.claim() && !system.is_finalized() {
                finalize(system, trigger, bus).await;
            }
        }

        if finalizer.is_claimed() {
            ticker.tick().await;
            continue;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            _ = any_exit(handles) => {}
        }
    }
}

/// Completes as soon as any worker's exit gate is open.
async fn any_exit(handles: &[WorkerHandle]) {
    if handles.is_empty() {
        return future::pending().await;
    }
    let exits = handles.iter().map(|h| Box::pin(h.exit_gate().signaled()));
    future::select_all(exits).await;
}

async fn finalize<S: System>(system: &Arc<S>, trigger: &str, bus: &Bus) {
    bus.publish(Event::new(EventKind::FinalizeRequested).with_worker(trigger));

    let sys = Arc::clone(system);
    match tokio::task::spawn_blocking(move || sys.finalize()).await {
        Ok(()) => bus.publish(Event::new(EventKind::Finalized)),
        Err(e) if e.is_panic() => {
            let info = panic_message(e.into_panic().as_ref());
            bus.publish(
                Event::new(EventKind::Finalized).with_reason(format!("finalize panicked: {info}")),
            );
        }
        Err(e) => {
            bus.publish(Event::new(EventKind::Finalized).with_reason(e.to_string()));
        }
    }
}
