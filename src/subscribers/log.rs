//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [launched] worker=display
//! [ready] worker=display
//! [launched] worker=ingestion
//! [ready] worker=ingestion
//! [begin-released]
//! [failed] worker=ingestion err="stream closed"
//! [finalize-requested] worker=ingestion
//! [finalized]
//! [shutdown-requested]
//! [all-stopped-within-grace]
//! ```

use crate::Subscribe;
use crate::events::{Event, EventKind};
use async_trait::async_trait;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use;
/// implement a custom [`Subscribe`] for structured logging or metrics.
#[derive(Default)]
pub struct LogWriter;

fn worker(e: &Event) -> &str {
    e.worker.as_deref().unwrap_or("?")
}

fn reason(e: &Event) -> &str {
    e.reason.as_deref().unwrap_or("")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::WorkerLaunched => println!("[launched] worker={}", worker(e)),
            EventKind::WorkerReady => println!("[ready] worker={}", worker(e)),
            EventKind::BeginReleased => println!("[begin-released]"),
            EventKind::StartupAborted => println!("[startup-aborted] worker={}", worker(e)),
            EventKind::WorkerStopped => println!("[stopped] worker={}", worker(e)),
            EventKind::WorkerFailed => {
                println!("[failed] worker={} err={:?}", worker(e), reason(e))
            }
            EventKind::WorkerPanicked => {
                println!("[panicked] worker={} info={:?}", worker(e), reason(e))
            }
            EventKind::FinalizeRequested => {
                println!("[finalize-requested] worker={}", worker(e))
            }
            EventKind::Finalized => println!("[finalized]"),
            EventKind::ShutdownRequested => println!("[shutdown-requested]"),
            EventKind::AllStoppedWithin => println!("[all-stopped-within-grace]"),
            EventKind::GraceExceeded => println!("[grace-exceeded] stuck={}", reason(e)),
            EventKind::SubscriberOverflow => {
                eprintln!("[pipevisor] subscriber '{}' dropped event", worker(e))
            }
            EventKind::SubscriberPanicked => {
                eprintln!("[pipevisor] subscriber '{}' panicked: {}", worker(e), reason(e))
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
