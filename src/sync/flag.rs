//! # GuardedFlag: one-way status publication across threads.
//!
//! A worker sets its flag when it terminates; the supervisor reads it. All
//! accesses are sequentially consistent, so a reader never observes a value
//! older than a write that happened-before the read.

use std::sync::atomic::{AtomicBool, Ordering};

/// Thread-safe boolean cell.
///
/// Starts `false`. In the lifecycle it is only ever moved to `true`, once,
/// by the worker it belongs to.
#[derive(Debug, Default)]
pub struct GuardedFlag {
    value: AtomicBool,
}

impl GuardedFlag {
    /// Creates a flag holding `false`.
    pub const fn new() -> Self {
        Self {
            value: AtomicBool::new(false),
        }
    }

    /// Returns the last value set.
    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }

    /// Atomically replaces the value.
    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::SeqCst);
    }
}

/// True if any flag in `flags` is set.
pub fn any_set<'a, I>(flags: I) -> bool
where
    I: IntoIterator<Item = &'a GuardedFlag>,
{
    flags.into_iter().any(GuardedFlag::get)
}
