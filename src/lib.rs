//! # pipevisor
//!
//! **pipevisor** bootstraps and supervises a threaded capture/display pipeline:
//! a display thread, an ingestion thread and the supervisor that starts them
//! together and finalizes the shared system when either one stops.
//!
//! ## Architecture
//! ```text
//!                       ┌────────────────────────────────────────┐
//!                       │ Supervisor::run(system, PipelineSpec)  │
//!                       └───────┬──────────────────────┬─────────┘
//!            launch + await     │                      │   launch + await
//!            ready gate         ▼                      ▼   ready gate
//!                  ┌─────────────────┐        ┌─────────────────┐
//!                  │ display thread  │        │ ingestion thread│
//!                  │  setup          │        │  setup          │
//!                  │  ctx.ready() ───┼─► 1    │  ctx.ready() ───┼─► 2
//!                  │  wait_begin() ◄─┼────────┼─ wait_begin() ◄─┼── 3: begin.notify()
//!                  │  main loop      │        │  main loop      │
//!                  └───────┬─────────┘        └───────┬─────────┘
//!                          │ exit guard: done = true  │
//!                          ▼                          ▼
//!                  ┌────────────────────────────────────────────┐
//!                  │ monitor: any done ─► system.finalize() ×1  │
//!                  └────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! 1. If display is enabled, launch it and wait until it is ready.
//! 2. Launch ingestion and wait until it is ready.
//! 3. Open the begin gate; both workers start their main loops together.
//! 4. When either worker exits (returns, errors, or panics), finalize the
//!    system exactly once.
//! 5. Stay resident until [`Supervisor::shutdown`] or an OS signal; then
//!    cancel the workers and wait for them within [`Config::grace`].
//!
//! ## Features
//! | Area              | Description                                              | Key types                               |
//! |-------------------|----------------------------------------------------------|-----------------------------------------|
//! | **Sync**          | One-shot broadcast gate, atomic completion flag          | [`Gate`], [`GuardedFlag`]               |
//! | **Workers**       | Blocking entry points run on dedicated OS threads        | [`Worker`], [`WorkerFn`], [`WorkerContext`] |
//! | **Supervision**   | Startup barrier, finalize-once monitor, shutdown         | [`Supervisor`], [`PipelineSpec`]        |
//! | **Events**        | Lifecycle events and subscriber fan-out                  | [`Event`], [`Subscribe`]                |
//! | **Errors**        | Typed runtime and worker errors                          | [`RuntimeError`], [`WorkerError`]       |
//! | **Configuration** | Poll interval, grace period, headless mode               | [`Config`]                              |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.

mod core;
mod error;
mod events;
mod subscribers;
pub mod sync;
mod system;
mod workers;

// ---- Public re-exports ----

pub use core::{Config, Supervisor, SupervisorBuilder};
pub use error::{RuntimeError, WorkerError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use sync::{Gate, GuardedFlag};
pub use system::System;
pub use workers::{PipelineSpec, Worker, WorkerContext, WorkerFn, WorkerKind, WorkerRef};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
