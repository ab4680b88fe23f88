//! End-to-end lifecycle tests driven through the public supervisor API.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use pipevisor::{
    Config, Event, EventKind, PipelineSpec, RuntimeError, Subscribe, Supervisor, System,
    WorkerContext, WorkerError, WorkerFn, WorkerRef,
};

#[derive(Default)]
struct Slam {
    finalized: AtomicBool,
    finalize_calls: AtomicUsize,
}

impl System for Slam {
    fn finalize(&self) {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        self.finalized.store(true, Ordering::SeqCst);
    }

    fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }
}

impl Slam {
    fn calls(&self) -> usize {
        self.finalize_calls.load(Ordering::SeqCst)
    }
}

type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

fn test_config() -> Config {
    Config {
        poll_interval: Duration::from_millis(10),
        grace: Duration::from_secs(2),
        handle_os_signals: false,
        ..Config::default()
    }
}

fn spawn_run(
    sup: &Arc<Supervisor>,
    system: &Arc<Slam>,
    spec: PipelineSpec<Slam>,
) -> JoinHandle<Result<(), RuntimeError>> {
    let sup = Arc::clone(sup);
    let system = Arc::clone(system);
    tokio::spawn(async move { sup.run(system, spec).await })
}

async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// Worker that loops until shutdown, logging its lifecycle steps.
fn looping(name: &'static str, log: Log) -> WorkerRef<Slam> {
    WorkerFn::arc(name, move |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
        push(&log, format!("{name}:setup"));
        ctx.ready();
        ctx.wait_begin();
        push(&log, format!("{name}:main"));
        while !ctx.is_cancelled() {
            thread::sleep(Duration::from_millis(2));
        }
        Ok(())
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn headless_ingestion_finalizes_once_and_stays_resident() {
    let log: Log = Arc::default();
    let system = Arc::new(Slam::default());

    let input = {
        let log = Arc::clone(&log);
        WorkerFn::arc("ingestion", move |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
            push(&log, "ingestion:setup");
            ctx.ready();
            ctx.wait_begin();
            push(&log, format!("ingestion:main begun={}", ctx.is_begun()));
            Ok(())
        })
    };
    let viewer_ran = Arc::new(AtomicBool::new(false));
    let viewer = {
        let ran = Arc::clone(&viewer_ran);
        WorkerFn::arc("viewer", move |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
            ran.store(true, Ordering::SeqCst);
            ctx.ready();
            Ok(())
        })
    };

    let cfg = Config {
        headless: true,
        ..test_config()
    };
    let sup = Supervisor::builder(cfg).build();
    let spec = PipelineSpec::new(input).with_display(viewer);
    let runner = spawn_run(&sup, &system, spec);

    assert!(eventually(|| system.calls() == 1).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(system.calls(), 1);
    assert!(!runner.is_finished(), "run must stay resident after finalize");

    sup.shutdown();
    runner.await.unwrap().unwrap();

    assert!(!viewer_ran.load(Ordering::SeqCst));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["ingestion:setup", "ingestion:main begun=true"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn begin_is_held_until_slow_display_is_ready() {
    let log: Log = Arc::default();
    let system = Arc::new(Slam::default());

    let viewer = {
        let log = Arc::clone(&log);
        WorkerFn::arc("viewer", move |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
            push(&log, "viewer:setup");
            thread::sleep(Duration::from_millis(150));
            push(&log, "viewer:ready");
            ctx.ready();
            ctx.wait_begin();
            push(&log, "viewer:main");
            while !ctx.is_cancelled() {
                thread::sleep(Duration::from_millis(2));
            }
            Ok(())
        })
    };
    let input = looping("ingestion", Arc::clone(&log));

    let sup = Supervisor::builder(test_config()).build();
    let mut rx = sup.bus().subscribe();
    let runner = spawn_run(&sup, &system, PipelineSpec::new(input).with_display(viewer));

    assert!(eventually(|| log.lock().unwrap().len() == 5).await);

    let entries = log.lock().unwrap().clone();
    let pos = |s: &str| entries.iter().position(|e| e == s).unwrap();
    assert!(pos("viewer:ready") < pos("ingestion:setup"));
    assert!(pos("ingestion:setup") < pos("viewer:main"));
    assert!(pos("ingestion:setup") < pos("ingestion:main"));

    sup.shutdown();
    runner.await.unwrap().unwrap();

    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        kinds.push((ev.kind, ev.worker.as_deref().map(str::to_string)));
    }
    let idx = |k: EventKind, w: Option<&str>| {
        kinds
            .iter()
            .position(|(kind, worker)| *kind == k && worker.as_deref() == w)
            .unwrap()
    };
    assert!(
        idx(EventKind::WorkerReady, Some("viewer"))
            < idx(EventKind::WorkerLaunched, Some("ingestion"))
    );
    assert!(idx(EventKind::WorkerReady, Some("ingestion")) < idx(EventKind::BeginReleased, None));
    assert!(idx(EventKind::ShutdownRequested, None) < idx(EventKind::AllStoppedWithin, None));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn simultaneous_exits_finalize_exactly_once() {
    for _ in 0..10 {
        let system = Arc::new(Slam::default());
        let together = Arc::new(Barrier::new(2));

        let make = |name: &'static str| -> WorkerRef<Slam> {
            let together = Arc::clone(&together);
            WorkerFn::arc(name, move |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
                ctx.ready();
                ctx.wait_begin();
                together.wait();
                Ok(())
            })
        };

        let sup = Supervisor::builder(test_config()).build();
        let spec = PipelineSpec::new(make("ingestion")).with_display(make("viewer"));
        let runner = spawn_run(&sup, &system, spec);

        assert!(eventually(|| system.calls() >= 1).await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(system.calls(), 1);

        sup.shutdown();
        runner.await.unwrap().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_worker_still_triggers_finalize() {
    let system = Arc::new(Slam::default());
    let log: Log = Arc::default();

    let viewer = looping("viewer", Arc::clone(&log));
    let input = WorkerFn::arc("ingestion", |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
        ctx.ready();
        ctx.wait_begin();
        Err(WorkerError::Fail {
            error: "camera disconnected".into(),
        })
    });

    let sup = Supervisor::builder(test_config()).build();
    let mut rx = sup.bus().subscribe();
    let runner = spawn_run(&sup, &system, PipelineSpec::new(input).with_display(viewer));

    assert!(eventually(|| system.calls() == 1).await);
    sup.shutdown();
    runner.await.unwrap().unwrap();

    let mut failed = None;
    let mut trigger = None;
    while let Ok(ev) = rx.try_recv() {
        match ev.kind {
            EventKind::WorkerFailed => failed = ev.reason.clone(),
            EventKind::FinalizeRequested => trigger = ev.worker.clone(),
            _ => {}
        }
    }
    assert!(failed.unwrap().contains("camera disconnected"));
    assert_eq!(trigger.as_deref(), Some("ingestion"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn display_exiting_before_ready_aborts_startup() {
    let system = Arc::new(Slam::default());
    let input_ran = Arc::new(AtomicBool::new(false));

    let viewer = WorkerFn::arc("viewer", |_ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
        Err(WorkerError::Setup {
            error: "no display".into(),
        })
    });
    let input = {
        let ran = Arc::clone(&input_ran);
        WorkerFn::arc("ingestion", move |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
            ran.store(true, Ordering::SeqCst);
            ctx.ready();
            Ok(())
        })
    };

    let sup = Supervisor::builder(test_config()).build();
    let mut rx = sup.bus().subscribe();
    let runner = spawn_run(&sup, &system, PipelineSpec::new(input).with_display(viewer));

    assert!(eventually(|| system.calls() == 1).await);
    sup.shutdown();
    runner.await.unwrap().unwrap();

    assert!(!input_ran.load(Ordering::SeqCst));
    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        kinds.push(ev.kind);
    }
    assert!(kinds.contains(&EventKind::StartupAborted));
    assert!(!kinds.contains(&EventKind::BeginReleased));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stuck_worker_exceeds_grace() {
    let system = Arc::new(Slam::default());
    let release = Arc::new(AtomicBool::new(false));

    let input = {
        let release = Arc::clone(&release);
        WorkerFn::arc("stubborn", move |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
            ctx.ready();
            ctx.wait_begin();
            while !release.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        })
    };

    let cfg = Config {
        grace: Duration::from_millis(100),
        ..test_config()
    };
    let sup = Supervisor::builder(cfg).build();
    let runner = spawn_run(&sup, &system, PipelineSpec::new(input));

    tokio::time::sleep(Duration::from_millis(50)).await;
    sup.shutdown();
    let res = runner.await.unwrap();
    release.store(true, Ordering::SeqCst);

    match res {
        Err(RuntimeError::GraceExceeded { grace, stuck }) => {
            assert_eq!(grace, Duration::from_millis(100));
            assert_eq!(stuck, vec!["stubborn".to_string()]);
        }
        other => panic!("expected GraceExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_before_run_returns_without_launching() {
    let system = Arc::new(Slam::default());
    let ran = Arc::new(AtomicBool::new(false));
    let input = {
        let ran = Arc::clone(&ran);
        WorkerFn::arc("ingestion", move |_ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
            ran.store(true, Ordering::SeqCst);
            Ok(())
        })
    };

    let sup = Supervisor::builder(test_config()).build();
    sup.shutdown();
    assert!(sup.is_shutting_down());
    sup.run(Arc::clone(&system), PipelineSpec::new(input))
        .await
        .unwrap();

    assert_eq!(system.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_ends_run_while_display_setup_hangs() {
    let system = Arc::new(Slam::default());
    let input_ran = Arc::new(AtomicBool::new(false));

    let viewer = WorkerFn::arc("viewer", |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
        while !ctx.is_cancelled() {
            thread::sleep(Duration::from_millis(2));
        }
        Err(WorkerError::Canceled)
    });
    let input = {
        let ran = Arc::clone(&input_ran);
        WorkerFn::arc("ingestion", move |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
            ran.store(true, Ordering::SeqCst);
            ctx.ready();
            Ok(())
        })
    };

    let sup = Supervisor::builder(test_config()).build();
    let runner = spawn_run(&sup, &system, PipelineSpec::new(input).with_display(viewer));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!runner.is_finished());
    sup.shutdown();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("run did not end on shutdown")
        .unwrap()
        .unwrap();

    assert!(!input_ran.load(Ordering::SeqCst));
    assert_eq!(system.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn worker_parked_on_begin_is_reported_stuck() {
    let system = Arc::new(Slam::default());
    let release = Arc::new(AtomicBool::new(false));

    // Stays parked on the begin gate for the rest of the test process.
    let viewer = WorkerFn::arc("viewer", |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
        ctx.ready();
        ctx.wait_begin();
        Ok(())
    });
    let input = {
        let release = Arc::clone(&release);
        WorkerFn::arc("ingestion", move |_ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
            while !release.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        })
    };

    let cfg = Config {
        grace: Duration::from_millis(100),
        ..test_config()
    };
    let sup = Supervisor::builder(cfg).build();
    let runner = spawn_run(&sup, &system, PipelineSpec::new(input).with_display(viewer));

    tokio::time::sleep(Duration::from_millis(50)).await;
    sup.shutdown();
    let res = runner.await.unwrap();
    release.store(true, Ordering::SeqCst);

    match res {
        Err(RuntimeError::GraceExceeded { stuck, .. }) => {
            assert_eq!(stuck, vec!["viewer".to_string(), "ingestion".to_string()]);
        }
        other => panic!("expected GraceExceeded, got {other:?}"),
    }
}

struct Exploder;

#[async_trait]
impl Subscribe for Exploder {
    async fn on_event(&self, _ev: &Event) {
        panic!("subscriber bug");
    }

    fn name(&self) -> &'static str {
        "exploder"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_subscriber_is_reported_once_per_event() {
    let system = Arc::new(Slam::default());
    let log: Log = Arc::default();

    let sup = Supervisor::builder(test_config())
        .with_subscriber(Arc::new(Exploder))
        .build();
    let mut rx = sup.bus().subscribe();
    let runner = spawn_run(&sup, &system, PipelineSpec::new(looping("ingestion", log)));

    let mut lifecycle = 0;
    let mut panics = 0;
    let deadline = tokio::time::Instant::now() + Duration::from_millis(300);
    while let Ok(res) = tokio::time::timeout_at(deadline, rx.recv()).await {
        match res {
            Ok(ev) if ev.kind == EventKind::SubscriberPanicked => panics += 1,
            Ok(_) => lifecycle += 1,
            Err(e) => panic!("bus receiver failed: {e}"),
        }
    }

    // launched, ready, begin released
    assert_eq!(lifecycle, 3);
    assert_eq!(panics, lifecycle);

    sup.shutdown();
    runner.await.unwrap().unwrap();
}

struct Recorder {
    seen: Arc<Mutex<Vec<EventKind>>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.seen.lock().unwrap().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribers_observe_the_full_lifecycle() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let system = Arc::new(Slam::default());

    let input = WorkerFn::arc("ingestion", |ctx: WorkerContext<Slam>| -> Result<(), WorkerError> {
        ctx.ready();
        ctx.wait_begin();
        Ok(())
    });

    let sup = Supervisor::builder(test_config())
        .with_subscriber(Arc::new(Recorder {
            seen: Arc::clone(&seen),
        }))
        .build();
    let runner = spawn_run(&sup, &system, PipelineSpec::new(input));

    assert!(eventually(|| seen.lock().unwrap().contains(&EventKind::Finalized)).await);
    sup.shutdown();
    runner.await.unwrap().unwrap();
    assert!(eventually(|| seen.lock().unwrap().contains(&EventKind::AllStoppedWithin)).await);

    let seen = seen.lock().unwrap().clone();
    let pos = |k: EventKind| seen.iter().position(|s| *s == k).unwrap();
    assert!(pos(EventKind::WorkerLaunched) < pos(EventKind::WorkerReady));
    assert!(pos(EventKind::WorkerReady) < pos(EventKind::BeginReleased));
    assert!(pos(EventKind::BeginReleased) < pos(EventKind::FinalizeRequested));
    assert!(pos(EventKind::FinalizeRequested) < pos(EventKind::Finalized));
    assert!(pos(EventKind::Finalized) < pos(EventKind::ShutdownRequested));
}
