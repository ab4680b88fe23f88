//! # Supervisor: startup barrier, lifecycle monitor and shutdown.
//!
//! The [`Supervisor`] owns the event bus, the [`SubscriberSet`], the runtime
//! configuration and the shutdown token. [`Supervisor::run`] drives one
//! pipeline through its whole life.
//!
//! ## High-level architecture
//! ```text
//! run(system, PipelineSpec)
//!   ├─► subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   │
//!   ├─► sequencer::run()                      ◄── raced against shutdown_requested()
//!   │     display? ─► launch ─► ready ─► ingestion ─► launch ─► ready ─► begin.notify()
//!   │
//!   ├─► monitor::run()                        ◄── raced against shutdown_requested()
//!   │     any worker done ─► finalize() once ─► stay resident
//!   │
//!   └─► shutdown path:
//!         publish(ShutdownRequested)
//!         token.cancel()              → workers see ctx.is_cancelled()
//!         wait_all_with_grace(cfg.grace):
//!            ├─ all exited    → publish(AllStoppedWithin), Ok(())
//!            └─ grace elapsed → publish(GraceExceeded), Err(GraceExceeded { stuck })
//! ```
//!
//! `shutdown_requested()` resolves on [`Supervisor::shutdown`] or, when
//! [`Config::handle_os_signals`] is set, on an OS termination signal.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use pipevisor::{
//!     Config, PipelineSpec, Supervisor, System, WorkerContext, WorkerError, WorkerFn, WorkerRef,
//! };
//!
//! #[derive(Default)]
//! struct Slam(AtomicBool);
//!
//! impl System for Slam {
//!     fn finalize(&self) { self.0.store(true, Ordering::SeqCst) }
//!     fn is_finalized(&self) -> bool { self.0.load(Ordering::SeqCst) }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input: WorkerRef<Slam> = WorkerFn::arc("input", |ctx: WorkerContext<Slam>| {
//!         // open the camera...
//!         ctx.ready();
//!         ctx.wait_begin();
//!         while !ctx.is_cancelled() {
//!             // feed frames...
//!             # break;
//!         }
//!         Ok::<_, WorkerError>(())
//!     });
//!
//!     let sup = Supervisor::builder(Config::default()).build();
//!     sup.run(Arc::new(Slam::default()), PipelineSpec::new(input)).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use futures::future;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::core::{Config, monitor, sequencer, shutdown};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::SubscriberSet;
use crate::sync::Gate;
use crate::system::System;
use crate::workers::{PipelineSpec, Shared, WorkerHandle};

use super::builder::SupervisorBuilder;

/// Coordinates the pipeline workers, event delivery and shutdown.
///
/// A supervisor drives a single pipeline: call [`run`](Supervisor::run) once.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    token: CancellationToken,
}

impl Supervisor {
    /// Creates a builder.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            token,
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus; subscribe to observe the lifecycle directly.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Requests shutdown. `run` stops monitoring, cancels the workers and
    /// waits for them within the grace period.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// True once shutdown was requested.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs the pipeline until shutdown is requested.
    ///
    /// Workers are launched and released as described in the module docs. When
    /// either worker terminates, `system` is finalized exactly once; `run`
    /// keeps waiting after that, since exit is an external decision.
    ///
    /// # Errors
    /// - [`RuntimeError::Spawn`] if a worker thread cannot be created. This is
    ///   fatal: a worker launched earlier stays parked on the begin gate and
    ///   the caller is expected to exit the process.
    /// - [`RuntimeError::GraceExceeded`] if workers did not exit within
    ///   [`Config::grace`] after shutdown.
    pub async fn run<S: System>(
        &self,
        system: Arc<S>,
        spec: PipelineSpec<S>,
    ) -> Result<(), RuntimeError> {
        self.subscriber_listener();

        let shared = Shared {
            system: Arc::clone(&system),
            begin: Arc::new(Gate::new()),
            token: self.token.clone(),
            bus: self.bus.clone(),
        };
        let mut handles: Vec<WorkerHandle> = Vec::new();

        let startup = tokio::select! {
            res = sequencer::run(&self.cfg, spec, &shared, &mut handles) => Some(res),
            _ = self.shutdown_requested() => None,
        };

        if let Some(res) = startup {
            if let Err(e) = res {
                self.token.cancel();
                return Err(e);
            }
            tokio::select! {
                _ = monitor::run(&self.cfg, &system, &handles, &self.bus) => {}
                _ = self.shutdown_requested() => {}
            }
        }

        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.token.cancel();
        self.wait_all_with_grace(&mut handles).await
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// Resolves on an explicit [`shutdown`](Supervisor::shutdown) or an OS signal.
    async fn shutdown_requested(&self) {
        if !self.cfg.handle_os_signals {
            return self.token.cancelled().await;
        }
        tokio::select! {
            _ = self.token.cancelled() => {}
            res = shutdown::wait_for_shutdown_signal() => {
                // Listeners could not be installed; explicit shutdown still works.
                if res.is_err() {
                    self.token.cancelled().await;
                }
            }
        }
    }

    /// Waits for every worker thread to exit within the configured grace period.
    async fn wait_all_with_grace(&self, handles: &mut [WorkerHandle]) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let exits = future::join_all(handles.iter().map(|h| h.exit_gate().signaled()));
        let timed = tokio::time::timeout(grace, exits).await;

        let finished: Vec<_> = handles.iter_mut().filter_map(|h| h.take_finished()).collect();
        if !finished.is_empty() {
            let _ = tokio::task::spawn_blocking(move || {
                for t in finished {
                    let _ = t.join();
                }
            })
            .await;
        }

        match timed {
            Ok(_) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<String> = handles
                    .iter()
                    .filter(|h| !h.is_done())
                    .map(|h| h.name().to_string())
                    .collect();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}
