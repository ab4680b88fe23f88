//! # Capture/display pipeline
//!
//! Demonstrates the pipevisor lifecycle:
//! - Display and ingestion threads with a shared startup barrier
//! - Finalize-once when the input stream runs dry
//! - Staying resident until Ctrl-C, then graceful shutdown
//!
//! Run with `cargo run --example pipeline --features logging [-- --no-gui]`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use pipevisor::{
    Config, LogWriter, PipelineSpec, Supervisor, System, WorkerContext, WorkerError, WorkerFn,
    WorkerRef,
};

/// Toy tracking system: counts frames and flushes a "map" on finalize.
#[derive(Default)]
struct Tracker {
    frames: AtomicU64,
    keyframes: Mutex<Vec<u64>>,
    finalized: AtomicBool,
}

impl System for Tracker {
    fn finalize(&self) {
        let keyframes = self.keyframes.lock().map(|k| k.len()).unwrap_or(0);
        println!(
            "🗺️  Tracker: finalizing after {} frames, {} keyframes",
            self.frames.load(Ordering::SeqCst),
            keyframes
        );
        self.finalized.store(true, Ordering::SeqCst);
    }

    fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }
}

/// Reads a fixed number of frames, then ends like an exhausted file source.
fn ingestion(frames: u64) -> WorkerRef<Tracker> {
    WorkerFn::arc("ingestion", move |ctx: WorkerContext<Tracker>| {
        println!("📷 Ingestion: opening stream");
        thread::sleep(Duration::from_millis(200));
        ctx.ready();
        ctx.wait_begin();

        for i in 0..frames {
            if ctx.is_cancelled() {
                return Err(WorkerError::Canceled);
            }
            let tracker = ctx.system();
            tracker.frames.fetch_add(1, Ordering::SeqCst);
            if i % 10 == 0
                && let Ok(mut k) = tracker.keyframes.lock()
            {
                k.push(i);
            }
            thread::sleep(Duration::from_millis(30));
        }
        println!("📷 Ingestion: end of stream");
        Ok(())
    })
}

/// Redraws until shutdown.
fn display() -> WorkerRef<Tracker> {
    WorkerFn::arc("display", |ctx: WorkerContext<Tracker>| {
        println!("🖥️  Display: creating window");
        thread::sleep(Duration::from_millis(300));
        ctx.ready();
        ctx.wait_begin();

        while !ctx.is_cancelled() {
            let frames = ctx.system().frames.load(Ordering::SeqCst);
            println!("🖥️  Display: {frames} frames");
            thread::sleep(Duration::from_millis(500));
        }
        Err::<(), _>(WorkerError::Canceled)
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let headless = std::env::args().any(|a| a == "--no-gui");

    let cfg = Config {
        headless,
        grace: Duration::from_secs(3),
        ..Config::default()
    };

    let sup = Supervisor::builder(cfg)
        .with_subscriber(Arc::new(LogWriter))
        .build();

    let spec = PipelineSpec::new(ingestion(100)).with_display(display());
    println!("Running; press Ctrl-C to exit.");
    sup.run(Arc::new(Tracker::default()), spec).await?;

    println!("Stopped cleanly.");
    Ok(())
}
