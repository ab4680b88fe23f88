//! # Worker abstractions and the thread launcher.
//!
//! - [`Worker`] - trait for a blocking pipeline entry point
//! - [`WorkerFn`] - closure-backed worker
//! - [`WorkerRef`] - shared reference to a worker (`Arc<dyn Worker<S>>`)
//! - [`WorkerContext`] - what a worker thread sees of the lifecycle
//! - [`PipelineSpec`] - ingestion + optional display entry points
//! - `WorkerHandle` - supervisor-side descriptor of a launched thread

mod context;
mod launcher;
mod spec;
mod worker;

pub use context::WorkerContext;
pub use launcher::WorkerKind;
pub(crate) use launcher::{Shared, WorkerHandle, launch};
pub use spec::PipelineSpec;
pub use worker::{Worker, WorkerFn, WorkerRef};
