//! # Worker abstraction and function-backed implementation.
//!
//! A [`Worker`] is the entry point of one pipeline thread. It receives a
//! [`WorkerContext`] and is expected to:
//!
//! 1. perform its internal setup (open a window, a device, a stream);
//! 2. call [`WorkerContext::ready`] once setup is complete;
//! 3. call [`WorkerContext::wait_begin`] before touching pipeline data;
//! 4. run its main loop until its own termination condition.
//!
//! Setting the completion flag is **not** the worker's job: the launcher does
//! it when the thread exits, on every path including panics.

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::WorkerError;
use crate::system::System;
use crate::workers::WorkerContext;

/// # Blocking entry point of a pipeline thread.
///
/// # Example
/// ```
/// use pipevisor::{System, Worker, WorkerContext, WorkerError};
///
/// struct Viewer;
///
/// impl<S: System> Worker<S> for Viewer {
///     fn name(&self) -> &str { "viewer" }
///
///     fn run(&self, ctx: WorkerContext<S>) -> Result<(), WorkerError> {
///         // create the window...
///         ctx.ready();
///         ctx.wait_begin();
///         while !ctx.is_cancelled() && !ctx.system().is_finalized() {
///             // draw a frame...
///             # break;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Worker<S: System>: Send + Sync + 'static {
    /// Returns a stable, human-readable worker name.
    fn name(&self) -> &str;

    /// Runs the worker on its own OS thread until it terminates.
    fn run(&self, ctx: WorkerContext<S>) -> Result<(), WorkerError>;
}

/// Shared handle to a worker entry point.
pub type WorkerRef<S> = Arc<dyn Worker<S>>;

/// Function-backed worker.
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use pipevisor::{System, Worker, WorkerContext, WorkerError, WorkerFn, WorkerRef};
///
/// # #[derive(Default)] struct Slam(AtomicBool);
/// # impl System for Slam {
/// #     fn finalize(&self) { self.0.store(true, Ordering::SeqCst) }
/// #     fn is_finalized(&self) -> bool { self.0.load(Ordering::SeqCst) }
/// # }
/// let w: WorkerRef<Slam> = WorkerFn::arc("ingestion", |ctx: WorkerContext<Slam>| {
///     ctx.ready();
///     ctx.wait_begin();
///     Ok::<_, WorkerError>(())
/// });
/// assert_eq!(w.name(), "ingestion");
/// ```
#[derive(Debug)]
pub struct WorkerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> WorkerFn<F> {
    /// Creates a new function-backed worker.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the worker and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<S, F> Worker<S> for WorkerFn<F>
where
    S: System,
    F: Fn(WorkerContext<S>) -> Result<(), WorkerError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: WorkerContext<S>) -> Result<(), WorkerError> {
        (self.f)(ctx)
    }
}
