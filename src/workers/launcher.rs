//! # Worker launcher: one OS thread per worker, with a guaranteed exit path.
//!
//! ```text
//! launch(kind, worker, shared)
//!   ├─► ready  = Gate::new()      (opened by ctx.ready())
//!   ├─► done   = GuardedFlag      (set on exit)
//!   ├─► exited = Gate::new()      (opened on exit, after `done`)
//!   └─► thread::Builder::spawn ──► ExitGuard armed
//!                                   ├─► publish WorkerLaunched
//!                                   ├─► catch_unwind(worker.run(ctx))
//!                                   ├─► publish WorkerStopped / WorkerFailed / WorkerPanicked
//!                                   └─► drop(ExitGuard): done.set(true), exited.notify()
//! ```
//!
//! ## Rules
//! - The completion flag is set on **every** exit path (return, error, panic).
//! - Thread creation failure is returned as [`RuntimeError::Spawn`]; the
//!   supervisor treats it as fatal.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio_util::sync::CancellationToken;

use crate::error::{RuntimeError, WorkerError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::panic_message;
use crate::sync::{Gate, GuardedFlag};
use crate::system::System;
use crate::workers::{WorkerContext, WorkerRef};

/// Role of a worker in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    /// Display / interaction thread (optional).
    Display,
    /// Data ingestion / processing thread.
    Ingestion,
}

impl WorkerKind {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerKind::Display => "display",
            WorkerKind::Ingestion => "ingestion",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordination state shared by every worker of one run.
pub(crate) struct Shared<S> {
    pub system: Arc<S>,
    pub begin: Arc<Gate>,
    pub token: CancellationToken,
    pub bus: Bus,
}

/// Descriptor of a launched worker, owned by the supervisor.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    name: Arc<str>,
    thread: Option<JoinHandle<()>>,
    ready: Arc<Gate>,
    done: Arc<GuardedFlag>,
    exited: Arc<Gate>,
}

impl WorkerHandle {
    /// Name reported by the worker entry point.
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Readiness gate, opened by the worker once setup is complete.
    pub(crate) fn ready_gate(&self) -> &Arc<Gate> {
        &self.ready
    }

    /// Completion flag, set when the worker thread exits.
    pub(crate) fn done_flag(&self) -> &GuardedFlag {
        &self.done
    }

    /// True once the worker thread has exited.
    pub(crate) fn is_done(&self) -> bool {
        self.done.get()
    }

    /// Gate opened right after the completion flag is set.
    pub(crate) fn exit_gate(&self) -> &Arc<Gate> {
        &self.exited
    }

    /// Hands out the join handle once the worker has exited.
    ///
    /// Returns `None` for a live worker, so callers never join a thread that
    /// is still running its entry point.
    pub(crate) fn take_finished(&mut self) -> Option<JoinHandle<()>> {
        if !self.is_done() {
            return None;
        }
        self.thread.take()
    }
}

/// Sets the completion flag when dropped, whatever way the thread ends.
struct ExitGuard {
    done: Arc<GuardedFlag>,
    exited: Arc<Gate>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.done.set(true);
        self.exited.notify();
    }
}

/// Spawns `worker` on a dedicated OS thread.
pub(crate) fn launch<S: System>(
    kind: WorkerKind,
    worker: WorkerRef<S>,
    shared: &Shared<S>,
) -> Result<WorkerHandle, RuntimeError> {
    let name: Arc<str> = Arc::from(worker.name());
    let ready = Arc::new(Gate::new());
    let done = Arc::new(GuardedFlag::new());
    let exited = Arc::new(Gate::new());

    let ctx = WorkerContext {
        kind,
        name: Arc::clone(&name),
        system: Arc::clone(&shared.system),
        ready: Arc::clone(&ready),
        begin: Arc::clone(&shared.begin),
        token: shared.token.clone(),
        bus: shared.bus.clone(),
    };
    let bus = shared.bus.clone();
    let thread_done = Arc::clone(&done);
    let thread_exited = Arc::clone(&exited);
    let thread_name = Arc::clone(&name);

    let thread = thread::Builder::new()
        .name(format!("pipevisor-{kind}"))
        .spawn(move || {
            let _guard = ExitGuard {
                done: thread_done,
                exited: thread_exited,
            };
            bus.publish(
                Event::new(EventKind::WorkerLaunched).with_worker(Arc::clone(&thread_name)),
            );
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.run(ctx)));
            bus.publish(exit_event(thread_name, outcome));
        })
        .map_err(|source| RuntimeError::Spawn {
            worker: kind,
            source,
        })?;

    Ok(WorkerHandle {
        name,
        thread: Some(thread),
        ready,
        done,
        exited,
    })
}

fn exit_event(
    name: Arc<str>,
    outcome: std::thread::Result<Result<(), WorkerError>>,
) -> Event {
    match outcome {
        Ok(Ok(())) => Event::new(EventKind::WorkerStopped).with_worker(name),
        Ok(Err(e)) if !e.is_failure() => Event::new(EventKind::WorkerStopped).with_worker(name),
        Ok(Err(e)) => Event::new(EventKind::WorkerFailed)
            .with_worker(name)
            .with_reason(e.to_string()),
        Err(payload) => Event::new(EventKind::WorkerPanicked)
            .with_worker(name)
            .with_reason(panic_message(payload.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::WorkerFn;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Sys(AtomicBool);

    impl System for Sys {
        fn finalize(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
        fn is_finalized(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn shared() -> Shared<Sys> {
        Shared {
            system: Arc::new(Sys::default()),
            begin: Arc::new(Gate::new()),
            token: CancellationToken::new(),
            bus: Bus::new(64),
        }
    }

    fn join(mut handle: WorkerHandle) -> WorkerHandle {
        if let Some(t) = handle.thread.take() {
            t.join().unwrap();
        }
        handle
    }

    #[test]
    fn test_flag_set_after_normal_exit() {
        let shared = shared();
        let w: WorkerRef<Sys> =
            WorkerFn::arc("ok", |ctx: WorkerContext<Sys>| -> Result<(), WorkerError> {
                ctx.ready();
                Ok(())
            });
        let h = join(launch(WorkerKind::Ingestion, w, &shared).unwrap());
        assert!(h.is_done());
        assert!(h.ready_gate().is_signaled());
        assert!(h.exit_gate().is_signaled());
    }

    #[test]
    fn test_flag_set_after_error() {
        let shared = shared();
        let w: WorkerRef<Sys> =
            WorkerFn::arc("err", |_ctx: WorkerContext<Sys>| -> Result<(), WorkerError> {
                Err(WorkerError::Setup {
                    error: "no device".into(),
                })
            });
        let h = join(launch(WorkerKind::Ingestion, w, &shared).unwrap());
        assert!(h.is_done());
        assert!(!h.ready_gate().is_signaled());
    }

    #[test]
    fn test_flag_set_after_panic() {
        let shared = shared();
        let mut rx = shared.bus.subscribe();
        let w: WorkerRef<Sys> =
            WorkerFn::arc("panicky", |_ctx: WorkerContext<Sys>| -> Result<(), WorkerError> {
                panic!("window lost")
            });
        let h = join(launch(WorkerKind::Display, w, &shared).unwrap());
        assert!(h.is_done());

        let launched = rx.try_recv().unwrap();
        assert_eq!(launched.kind, EventKind::WorkerLaunched);
        let exit = rx.try_recv().unwrap();
        assert_eq!(exit.kind, EventKind::WorkerPanicked);
        assert_eq!(exit.reason.as_deref(), Some("window lost"));
    }

    #[test]
    fn test_worker_blocks_until_begin() {
        let shared = shared();
        let passed = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&passed);
        let w: WorkerRef<Sys> =
            WorkerFn::arc("gated", move |ctx: WorkerContext<Sys>| -> Result<(), WorkerError> {
                ctx.ready();
                ctx.wait_begin();
                seen.store(true, Ordering::SeqCst);
                Ok(())
            });
        let h = launch(WorkerKind::Ingestion, w, &shared).unwrap();
        h.ready_gate().wait();
        thread::sleep(Duration::from_millis(30));
        assert!(!passed.load(Ordering::SeqCst));
        assert!(!h.is_done());

        shared.begin.notify();
        let h = join(h);
        assert!(passed.load(Ordering::SeqCst));
        assert!(h.is_done());
    }

    #[test]
    fn test_canceled_counts_as_stopped() {
        let ev = exit_event(Arc::from("w"), Ok(Err(WorkerError::Canceled)));
        assert_eq!(ev.kind, EventKind::WorkerStopped);
    }
}
