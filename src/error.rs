//! Error types used by the pipevisor runtime and by worker entry points.
//!
//! - [`RuntimeError`] - errors raised by the supervisor itself.
//! - [`WorkerError`] - errors returned by a worker's `run`.
//!
//! Both provide `as_label` / `as_message` helpers for logs and metrics.

use std::time::Duration;
use thiserror::Error;

use crate::workers::WorkerKind;

/// # Errors produced by the pipevisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The OS refused to create a worker thread. No partial pipeline is run.
    #[error("failed to spawn {worker} worker thread: {source}")]
    Spawn {
        /// Which worker could not be launched.
        worker: WorkerKind,
        /// Error reported by the OS.
        #[source]
        source: std::io::Error,
    },

    /// Shutdown grace period was exceeded; some worker threads never exited.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of workers still running.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pipevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Spawn { .. } => "runtime_spawn_failed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::Spawn { worker, source } => {
                format!("spawn failed for {worker}: {source}")
            }
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck workers={stuck:?}")
            }
        }
    }
}

/// # Errors returned by worker entry points.
///
/// Any variant still counts as the worker's terminal transition: the
/// supervisor sees the worker as done and finalizes the system.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Internal setup (window creation, device or stream opening) failed.
    #[error("setup failed: {error}")]
    Setup {
        /// The underlying error message.
        error: String,
    },

    /// The main loop hit an unrecoverable error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The worker stopped because shutdown was requested.
    #[error("context cancelled")]
    Canceled,
}

impl WorkerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pipevisor::WorkerError;
    ///
    /// let err = WorkerError::Setup { error: "no camera".into() };
    /// assert_eq!(err.as_label(), "worker_setup_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Setup { .. } => "worker_setup_failed",
            WorkerError::Fail { .. } => "worker_failed",
            WorkerError::Canceled => "worker_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkerError::Setup { error } => format!("setup: {error}"),
            WorkerError::Fail { error } => format!("error: {error}"),
            WorkerError::Canceled => "context cancelled".to_string(),
        }
    }

    /// True for errors that mean the worker did not end on its own terms.
    ///
    /// `Canceled` is a graceful exit and returns `false`.
    pub fn is_failure(&self) -> bool {
        !matches!(self, WorkerError::Canceled)
    }
}
