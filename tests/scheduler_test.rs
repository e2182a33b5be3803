use paramflow::error::{JobError, ScopeError};
use paramflow::scheduler::scope::instance;
use paramflow::scheduler::{
    is_on_event_loop, ConcurrentExecution, Deferred, FailedExecution, JobOutcome, JobStats,
    ScheduledExecution, ScheduledJob, Scheduler, ScopedBean, SkipAfter, SuccessfulExecution,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

static NAEB_DESTROYED: AtomicUsize = AtomicUsize::new(0);

/// Request-scoped bean counting its destructions.
struct Naeb;

impl Naeb {
    fn do_something(&self) {}
}

impl ScopedBean for Naeb {
    fn create() -> Self {
        Naeb
    }

    fn pre_destroy(&self) {
        NAEB_DESTROYED.fetch_add(1, Ordering::SeqCst);
    }
}

fn noop(_: &ScheduledExecution) -> Result<JobOutcome, JobError> {
    Ok(JobOutcome::Completed)
}

async fn next_success(
    receiver: &mut broadcast::Receiver<SuccessfulExecution>,
) -> SuccessfulExecution {
    timeout(WAIT, receiver.recv())
        .await
        .expect("timed out waiting for a successful execution")
        .expect("event channel closed")
}

async fn next_failure(receiver: &mut broadcast::Receiver<FailedExecution>) -> FailedExecution {
    timeout(WAIT, receiver.recv())
        .await
        .expect("timed out waiting for a failed execution")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_non_blocking_jobs() {
    let void_on_event_loop = Arc::new(AtomicBool::new(false));
    let deferred_on_event_loop = Arc::new(AtomicBool::new(false));
    let future_on_event_loop = Arc::new(AtomicBool::new(false));
    let continuation_on_event_loop = Arc::new(AtomicBool::new(false));
    let void_executed = Arc::new(AtomicBool::new(false));
    let future_executed = Arc::new(AtomicBool::new(false));

    let every_void = {
        let on_loop = Arc::clone(&void_on_event_loop);
        let executed = Arc::clone(&void_executed);
        let skip = Arc::clone(&void_executed);
        ScheduledJob::every("every_void", "0.1s", move |_| {
            on_loop.store(is_on_event_loop(), Ordering::SeqCst);
            executed.store(true, Ordering::SeqCst);
            Ok(JobOutcome::Completed)
        })
        .unwrap()
        .non_blocking()
        .skip_if(move |_| skip.load(Ordering::SeqCst))
    };

    let every_deferred = {
        let on_loop = Arc::clone(&deferred_on_event_loop);
        let continuation_on_loop = Arc::clone(&continuation_on_event_loop);
        ScheduledJob::every("every_deferred", "0.1s", move |_| {
            on_loop.store(is_on_event_loop(), Ordering::SeqCst);
            let continuation_on_loop = Arc::clone(&continuation_on_loop);
            // The bean is created by the continuation, after this call returns.
            Ok(Deferred::void()
                .and_then(move || {
                    continuation_on_loop.store(is_on_event_loop(), Ordering::SeqCst);
                    instance::<Naeb>()?.do_something();
                    Ok(())
                })
                .into())
        })
        .unwrap()
        .non_blocking()
        .skip_with(Arc::new(SkipAfter::new(1)))
    };

    let every_deferred_fail = ScheduledJob::every("every_deferred_fail", "0.1s", |_| {
        // The bean is created before the call fails.
        instance::<Naeb>()?.do_something();
        Err(JobError::failed("FAIL!"))
    })
    .unwrap()
    .skip_with(Arc::new(SkipAfter::new(1)));

    let every_future = {
        let on_loop = Arc::clone(&future_on_event_loop);
        let executed = Arc::clone(&future_executed);
        let skip = Arc::clone(&future_executed);
        ScheduledJob::every("every_future", "0.1s", move |_| {
            on_loop.store(is_on_event_loop(), Ordering::SeqCst);
            executed.store(true, Ordering::SeqCst);
            Ok(JobOutcome::future(async { Ok(()) }))
        })
        .unwrap()
        .non_blocking()
        .skip_if(move |_| skip.load(Ordering::SeqCst))
    };

    let scheduler = Scheduler::builder()
        .with_job(every_void)
        .with_job(every_deferred)
        .with_job(every_deferred_fail)
        .with_job(every_future)
        .build()
        .unwrap();
    let mut successes = scheduler.events().successful().subscribe();
    let mut failures = scheduler.events().failed().subscribe();
    scheduler.start().unwrap();

    let mut succeeded = BTreeSet::new();
    while succeeded.len() < 3 {
        succeeded.insert(next_success(&mut successes).await.trigger_id().to_string());
    }
    let failure = next_failure(&mut failures).await;
    scheduler.shutdown().await;

    assert_eq!(
        succeeded,
        BTreeSet::from([
            "every_deferred".to_string(),
            "every_future".to_string(),
            "every_void".to_string(),
        ])
    );
    assert_eq!(failure.trigger_id(), "every_deferred_fail");
    assert_eq!(failure.error, JobError::failed("FAIL!"));

    assert!(void_on_event_loop.load(Ordering::SeqCst));
    assert!(deferred_on_event_loop.load(Ordering::SeqCst));
    assert!(continuation_on_event_loop.load(Ordering::SeqCst));
    assert!(future_on_event_loop.load(Ordering::SeqCst));

    // One bean per execution, each destroyed once.
    assert_eq!(NAEB_DESTROYED.load(Ordering::SeqCst), 2);

    let stats = scheduler.stats("every_deferred_fail").unwrap();
    assert_eq!(stats.fired, 1);
    assert_eq!(stats.succeeded, 0);
    assert_eq!(stats.failed, 1);
    while let Ok(event) = successes.try_recv() {
        assert_ne!(event.trigger_id(), "every_deferred_fail");
    }
}

#[tokio::test]
async fn test_worker_job_runs_off_event_loop() {
    let on_event_loop = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&on_event_loop);
    let scheduler = Scheduler::builder()
        .with_job(
            ScheduledJob::every("worker", "0.05s", move |_| {
                flag.store(is_on_event_loop(), Ordering::SeqCst);
                Ok(JobOutcome::Completed)
            })
            .unwrap(),
        )
        .build()
        .unwrap();
    let mut successes = scheduler.events().successful().subscribe();
    scheduler.start().unwrap();

    let event = next_success(&mut successes).await;
    scheduler.shutdown().await;

    assert_eq!(event.trigger_id(), "worker");
    assert_eq!(event.execution.sequence(), 1);
    assert!(event.completed_at >= event.execution.fire_time());
    assert!(!on_event_loop.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_sequence_and_previous_fire_time() {
    let scheduler = Scheduler::builder()
        .with_job(ScheduledJob::every("counted", "0.03s", noop).unwrap())
        .build()
        .unwrap();
    let mut successes = scheduler.events().successful().subscribe();
    scheduler.start().unwrap();

    let mut events = vec![
        next_success(&mut successes).await,
        next_success(&mut successes).await,
    ];
    scheduler.shutdown().await;

    // Worker executions may complete out of firing order.
    events.sort_by_key(|e| e.execution.sequence());
    let (first, second) = (&events[0], &events[1]);
    assert_eq!(first.execution.sequence(), 1);
    assert_eq!(first.execution.previous_fire_time(), None);
    assert_eq!(second.execution.sequence(), 2);
    assert_eq!(
        second.execution.previous_fire_time(),
        Some(first.execution.fire_time())
    );
}

#[tokio::test]
async fn test_panicking_job_is_a_failed_execution() {
    let scheduler = Scheduler::builder()
        .with_job(
            ScheduledJob::every("panics", "0.05s", |_| panic!("job blew up"))
                .unwrap()
                .skip_with(Arc::new(SkipAfter::new(1))),
        )
        .build()
        .unwrap();
    let mut failures = scheduler.events().failed().subscribe();
    scheduler.start().unwrap();

    let failure = next_failure(&mut failures).await;
    scheduler.shutdown().await;

    assert_eq!(
        failure.error,
        JobError::Panicked {
            message: "job blew up".to_string()
        }
    );
}

#[tokio::test]
async fn test_failed_future_and_deferred() {
    let scheduler = Scheduler::builder()
        .with_job(
            ScheduledJob::every("future_fails", "0.05s", |_| {
                Ok(JobOutcome::future(async { Err(JobError::failed("future failed")) }))
            })
            .unwrap()
            .skip_with(Arc::new(SkipAfter::new(1))),
        )
        .with_job(
            ScheduledJob::every("deferred_fails", "0.05s", |_| {
                Ok(Deferred::failure(JobError::failed("deferred failed")).into())
            })
            .unwrap()
            .non_blocking()
            .skip_with(Arc::new(SkipAfter::new(1))),
        )
        .build()
        .unwrap();
    let mut failures = scheduler.events().failed().subscribe();
    scheduler.start().unwrap();

    let mut messages = BTreeSet::new();
    for _ in 0..2 {
        let failure = next_failure(&mut failures).await;
        messages.insert((failure.trigger_id().to_string(), failure.error.to_string()));
    }
    scheduler.shutdown().await;

    assert_eq!(
        messages,
        BTreeSet::from([
            ("deferred_fails".to_string(), "deferred failed".to_string()),
            ("future_fails".to_string(), "future failed".to_string()),
        ])
    );
    assert_eq!(scheduler.stats("future_fails").unwrap().succeeded, 0);
    assert_eq!(scheduler.stats("deferred_fails").unwrap().succeeded, 0);
}

#[tokio::test]
async fn test_skipped_firing_has_no_invocation_or_event() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let scheduler = Scheduler::builder()
        .with_job(
            ScheduledJob::every("always_skipped", "0.02s", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(JobOutcome::Completed)
            })
            .unwrap()
            .skip_if(|_| true),
        )
        .build()
        .unwrap();
    let mut successes = scheduler.events().successful().subscribe();
    let mut failures = scheduler.events().failed().subscribe();
    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    scheduler.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(successes.try_recv().is_err());
    assert!(failures.try_recv().is_err());

    let stats = scheduler.stats("always_skipped").unwrap();
    assert_eq!(stats.fired, 0);
    assert!(stats.skipped > 0);
}

#[tokio::test]
async fn test_max_runs() {
    let scheduler = Scheduler::builder()
        .with_job(
            ScheduledJob::every("limited", "0.02s", noop)
                .unwrap()
                .skip_with(Arc::new(SkipAfter::new(2))),
        )
        .build()
        .unwrap();
    let mut successes = scheduler.events().successful().subscribe();
    scheduler.start().unwrap();

    next_success(&mut successes).await;
    next_success(&mut successes).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    scheduler.shutdown().await;

    let stats = scheduler.stats("limited").unwrap();
    assert_eq!(stats.fired, 2);
    assert_eq!(stats.succeeded, 2);
    assert!(stats.skipped > 0);
}

#[tokio::test]
async fn test_concurrent_execution_skip() {
    let scheduler = Scheduler::builder()
        .with_job(
            ScheduledJob::every("slow", "0.02s", |_| {
                Ok(JobOutcome::future(async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(())
                }))
            })
            .unwrap()
            .with_concurrency(ConcurrentExecution::Skip),
        )
        .build()
        .unwrap();
    let mut successes = scheduler.events().successful().subscribe();
    scheduler.start().unwrap();

    let first = next_success(&mut successes).await;
    scheduler.shutdown().await;

    assert_eq!(first.execution.sequence(), 1);
    let stats = scheduler.stats("slow").unwrap();
    assert!(stats.skipped > 0, "{stats:?}");
}

#[tokio::test]
async fn test_initial_delay() {
    let scheduler = Scheduler::builder()
        .with_job(
            ScheduledJob::every("delayed", "0.01s", noop)
                .unwrap()
                .with_delay(Duration::from_secs(30)),
        )
        .build()
        .unwrap();
    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    scheduler.shutdown().await;

    assert_eq!(scheduler.stats("delayed").unwrap(), JobStats::default());
}

#[tokio::test]
async fn test_paused_trigger_resumes() {
    let scheduler = Scheduler::builder()
        .with_job(ScheduledJob::every("pausable", "0.02s", noop).unwrap())
        .build()
        .unwrap();
    scheduler.pause("pausable").unwrap();
    let mut successes = scheduler.events().successful().subscribe();
    scheduler.start().unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(scheduler.stats("pausable").unwrap().fired, 0);

    scheduler.resume("pausable").unwrap();
    let event = next_success(&mut successes).await;
    scheduler.shutdown().await;
    assert_eq!(event.trigger_id(), "pausable");
}

#[tokio::test]
async fn test_observers_are_notified() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let scheduler = Scheduler::builder()
        .with_job(
            ScheduledJob::every("observed", "0.02s", noop)
                .unwrap()
                .skip_with(Arc::new(SkipAfter::new(1))),
        )
        .build()
        .unwrap();
    let sink = Arc::clone(&seen);
    scheduler.events().successful().observe(move |event| {
        sink.lock().unwrap().push(event.trigger_id().to_string());
    });
    let mut successes = scheduler.events().successful().subscribe();
    scheduler.start().unwrap();

    next_success(&mut successes).await;
    scheduler.shutdown().await;

    assert_eq!(*seen.lock().unwrap(), vec!["observed".to_string()]);
}

#[test]
fn test_scope_inactive_outside_execution() {
    assert!(matches!(instance::<Naeb>(), Err(ScopeError::NotActive)));
}
