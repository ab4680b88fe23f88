//! # Gate: one-shot broadcast rendezvous.
//!
//! A [`Gate`] starts closed. Any number of threads may block in [`Gate::wait`]
//! (or await [`Gate::signaled`] from async code). The first [`Gate::notify`]
//! opens it and releases every waiter; the gate then stays open for good, so
//! later `wait` calls return immediately.
//!
//! ## State machine
//! ```text
//!              notify()                       notify() / wait()
//!  ┌────────────┐   ──────►   ┌────────────┐   ──────►  (no-op)
//!  │ unsignaled │             │  signaled  │
//!  └────────────┘             └────────────┘
//!     wait() blocks              terminal
//! ```
//!
//! ## Rules
//! - `notify` before any `wait` is fine: the waiter never blocks.
//! - `notify` is idempotent; only the first call reports `true`.
//! - There is no timeout and no cancellation. A gate that is never opened
//!   keeps its waiters parked forever.
//!
//! Blocking waiters park on a [`Condvar`]; async waiters register on a
//! [`tokio::sync::Notify`] so the supervisor never blocks a runtime thread.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// One-shot, multi-waiter broadcast gate.
#[derive(Debug, Default)]
pub struct Gate {
    /// True once the gate has been opened.
    open: Mutex<bool>,
    /// Wakes blocked threads.
    cv: Condvar,
    /// Wakes async waiters.
    notify: Notify,
}

impl Gate {
    /// Creates a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks the calling thread until the gate has been opened.
    ///
    /// Returns immediately if [`notify`](Gate::notify) already happened.
    pub fn wait(&self) {
        let mut open = self.lock();
        while !*open {
            open = self.cv.wait(open).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Completes once the gate has been opened.
    ///
    /// Async counterpart of [`wait`](Gate::wait) with the same semantics.
    pub async fn signaled(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before probing so a racing notify() is not lost.
            notified.as_mut().enable();
            if self.is_signaled() {
                return;
            }
            notified.await;
        }
    }

    /// Opens the gate and wakes every waiter.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// gate was already open.
    pub fn notify(&self) -> bool {
        {
            let mut open = self.lock();
            if *open {
                return false;
            }
            *open = true;
            self.cv.notify_all();
        }
        self.notify.notify_waiters();
        true
    }

    /// Non-blocking probe.
    pub fn is_signaled(&self) -> bool {
        *self.lock()
    }

    // The guarded value is a plain bool, so a poisoned lock still holds a valid state.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
