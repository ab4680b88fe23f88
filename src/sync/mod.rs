//! Synchronization primitives shared by the supervisor and worker threads.
//!
//! - [`Gate`]: one-shot broadcast rendezvous (readiness and "begin" signals);
//! - [`GuardedFlag`]: atomic boolean used by workers to publish termination.

mod flag;
mod gate;

pub use flag::{GuardedFlag, any_set};
pub use gate::Gate;
