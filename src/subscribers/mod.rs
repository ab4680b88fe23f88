//! # Event subscribers for the pipevisor runtime.
//!
//! ```text
//!   worker exit guard ─┐
//!   sequencer        ──┼─ publish(Event) ──► Bus ──► SubscriberSet ──► Subscribe::on_event
//!   monitor          ──┘                                   ├──► LogWriter (feature "logging")
//!                                                          └──► user subscribers
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
