//! # PipelineSpec: the worker entry points handed to the supervisor.

use crate::system::System;
use crate::workers::WorkerRef;

/// Entry points of one pipeline run.
///
/// The ingestion worker is mandatory; the display worker is optional and
/// can also be switched off with [`Config::headless`](crate::Config::headless).
pub struct PipelineSpec<S: System> {
    /// Data-ingestion / processing worker.
    pub ingestion: WorkerRef<S>,
    /// Display / interaction worker.
    pub display: Option<WorkerRef<S>>,
}

impl<S: System> PipelineSpec<S> {
    /// Creates an ingestion-only spec.
    pub fn new(ingestion: WorkerRef<S>) -> Self {
        Self {
            ingestion,
            display: None,
        }
    }

    /// Adds a display worker.
    pub fn with_display(mut self, display: WorkerRef<S>) -> Self {
        self.display = Some(display);
        self
    }
}
