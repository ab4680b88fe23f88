//! # Lifecycle events emitted by the supervisor and worker threads.
//!
//! The [`EventKind`] enum classifies events into three groups:
//! - **Startup events**: worker launch, readiness, begin-gate release
//! - **Termination events**: worker stop/failure/panic and finalization
//! - **Shutdown events**: shutdown request and worker join outcome
//!
//! The [`Event`] struct carries metadata such as timestamp, worker name and reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use pipevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::WorkerFailed)
//!     .with_worker("ingestion")
//!     .with_reason("stream closed");
//!
//! assert_eq!(ev.kind, EventKind::WorkerFailed);
//! assert_eq!(ev.worker.as_deref(), Some("ingestion"));
//! assert_eq!(ev.reason.as_deref(), Some("stream closed"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Startup ===
    /// Worker thread was created.
    ///
    /// Sets: `worker`
    WorkerLaunched,

    /// Worker finished its internal setup and opened its readiness gate.
    ///
    /// Sets: `worker`
    WorkerReady,

    /// Every enabled worker is ready; the begin gate was opened.
    BeginReleased,

    /// A worker terminated before it became ready; the begin gate stays closed.
    ///
    /// Sets: `worker`
    StartupAborted,

    // === Termination ===
    /// Worker returned `Ok` or exited on cancellation.
    ///
    /// Sets: `worker`
    WorkerStopped,

    /// Worker returned an error.
    ///
    /// Sets: `worker`, `reason`
    WorkerFailed,

    /// Worker thread panicked.
    ///
    /// Sets: `worker`, `reason` (panic payload when it is a string)
    WorkerPanicked,

    /// A terminated worker was observed; finalization is starting.
    ///
    /// Sets: `worker` (the first worker seen done)
    FinalizeRequested,

    /// The shared system object was finalized.
    Finalized,

    // === Shutdown ===
    /// Shutdown requested (OS signal or explicit call).
    ShutdownRequested,

    /// All worker threads exited within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some worker threads are still running.
    ///
    /// Sets: `reason` (stuck worker names)
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `worker` (subscriber name), `reason`
    SubscriberOverflow,

    /// Subscriber panicked while handling an event.
    ///
    /// Sets: `worker` (subscriber name), `reason`
    SubscriberPanicked,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the worker, if applicable.
    pub worker: Option<Arc<str>>,
    /// Human-readable reason (errors, panic payloads, stuck workers).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            reason: None,
        }
    }

    /// Attaches a worker name.
    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_worker(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_worker(subscriber)
            .with_reason(info)
    }

    /// True for overflow and panic reports about a subscriber.
    ///
    /// These are never reported again when delivering them fails.
    #[inline]
    pub fn is_subscriber_report(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::WorkerLaunched);
        let b = Event::new(EventKind::WorkerReady);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_subscriber_report_kinds() {
        assert!(Event::subscriber_overflow("a", "full").is_subscriber_report());
        assert!(Event::subscriber_panicked("a", "boom".into()).is_subscriber_report());
        assert!(!Event::new(EventKind::WorkerPanicked).is_subscriber_report());
    }
}
