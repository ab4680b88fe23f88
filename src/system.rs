//! # The shared system object.
//!
//! Both workers read and mutate the system during their main loops; the
//! supervisor finalizes it exactly once when either worker terminates.
//! Synchronizing the domain state against concurrent worker access is the
//! implementor's job: `finalize` may run while workers are still exiting.

/// Shared system driven by the pipeline workers.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use pipevisor::System;
///
/// #[derive(Default)]
/// struct Slam { finalized: AtomicBool }
///
/// impl System for Slam {
///     fn finalize(&self) {
///         // flush the map, stop optimization...
///         self.finalized.store(true, Ordering::SeqCst);
///     }
///     fn is_finalized(&self) -> bool {
///         self.finalized.load(Ordering::SeqCst)
///     }
/// }
/// ```
pub trait System: Send + Sync + 'static {
    /// Terminal state transition. Called at most once by the supervisor.
    ///
    /// Runs on a blocking thread, concurrently with workers that may still
    /// be exiting.
    fn finalize(&self);

    /// True once [`finalize`](System::finalize) has completed.
    fn is_finalized(&self) -> bool;
}
