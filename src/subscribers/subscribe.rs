//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into the
//! runtime. Each subscriber is driven by a dedicated worker loop fed by a bounded
//! queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block the
//!   publisher nor other subscribers.
//! - Each subscriber declares its queue capacity via [`Subscribe::queue_capacity`].
//!   On overflow, events for that subscriber are **dropped**.
//!
//! ## Example
//! ```rust
//! use pipevisor::{Event, EventKind, Subscribe};
//!
//! struct FinalizeAudit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for FinalizeAudit {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::Finalized {
//!             // write audit record...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "finalize-audit" }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated task on the supervisor's runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
