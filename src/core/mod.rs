//! Runtime core: orchestration and lifecycle.
//!
//! The public API of this module is [`Supervisor`] (with its builder) and
//! [`Config`].
//!
//! Internal modules:
//! - [`sequencer`]: launches workers in order and releases the begin gate;
//! - [`monitor`]: watches completion flags and finalizes the system once;
//! - [`supervisor`]: ties startup, monitoring and shutdown together;
//! - [`shutdown`]: cross-platform OS signal handling.

mod builder;
mod config;
mod monitor;
mod sequencer;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::Config;
pub use supervisor::Supervisor;
