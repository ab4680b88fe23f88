//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings for the supervisor runtime.
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for worker threads on shutdown (only checks once)
//! - `poll_interval` below 1ms is clamped to 1ms

use std::time::Duration;

/// Smallest monitor tick the runtime will use.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `poll_interval`: how often the lifecycle monitor re-reads the completion flags
/// - `grace`: how long shutdown waits for worker threads to exit
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `headless`: skip the display worker even if one is supplied
/// - `handle_os_signals`: SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere) request shutdown
///
/// All fields are public; prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct Config {
    /// Interval at which the monitor polls the workers' completion flags.
    ///
    /// Worker exits also wake the monitor directly, so this only bounds the
    /// detection latency.
    pub poll_interval: Duration,

    /// Maximum time to wait for worker threads once shutdown was requested.
    ///
    /// Workers observe shutdown through `WorkerContext::is_cancelled`. If they
    /// have not exited within `grace`, `run` returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Run without the display worker.
    pub headless: bool,

    /// Treat OS termination signals as a shutdown request.
    pub handle_os_signals: bool,
}

impl Config {
    /// Returns the monitor tick, clamped to at least 1ms.
    #[inline]
    pub fn poll_interval_clamped(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `poll_interval = 1s`
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `headless = false`
    /// - `handle_os_signals = true`
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            headless: false,
            handle_os_signals: true,
        }
    }
}
