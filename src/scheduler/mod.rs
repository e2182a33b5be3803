pub mod affinity;
pub mod deferred;
pub mod events;
pub mod execution;
pub mod handler;
pub mod scope;
pub mod skip;
pub mod trigger;

pub use affinity::{is_on_event_loop, EventLoop, EventLoopHandle, ExecutionAffinity};
pub use deferred::Deferred;
pub use events::{EventBus, Topic, DEFAULT_EVENT_CAPACITY, MAX_EVENT_CAPACITY};
pub use execution::{FailedExecution, ScheduledExecution, SuccessfulExecution};
pub use handler::{JobHandler, JobOutcome};
pub use scope::{RequestScope, ScopedBean};
pub use skip::{SkipAfter, SkipPredicate};
pub use trigger::{parse_delay, parse_period, Trigger, MAX_PERIOD};

use crate::error::{JobError, SchedulerError};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

const EVENT_LOOP_THREAD_NAME: &str = "paramflow-event-loop";

/// Whether a firing may start while the previous one is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentExecution {
    #[default]
    Proceed,
    Skip,
}

pub struct ScheduledJob {
    trigger: Trigger,
    handler: Arc<dyn JobHandler>,
    skip: Option<Arc<dyn SkipPredicate>>,
    affinity: ExecutionAffinity,
    concurrency: ConcurrentExecution,
}

impl ScheduledJob {
    pub fn new<F>(trigger: Trigger, handler: F) -> Self
    where
        F: Fn(&ScheduledExecution) -> Result<JobOutcome, JobError> + Send + Sync + 'static,
    {
        Self::from_handler(trigger, Arc::new(handler))
    }

    /// Shorthand for `new` with a parsed period such as `"0.5s"`.
    pub fn every<F>(identity: impl Into<String>, period: &str, handler: F) -> Result<Self, SchedulerError>
    where
        F: Fn(&ScheduledExecution) -> Result<JobOutcome, JobError> + Send + Sync + 'static,
    {
        Ok(Self::new(Trigger::parse(identity, period)?, handler))
    }

    pub fn from_handler(trigger: Trigger, handler: Arc<dyn JobHandler>) -> Self {
        Self {
            trigger,
            handler,
            skip: None,
            affinity: ExecutionAffinity::default(),
            concurrency: ConcurrentExecution::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.trigger = self.trigger.with_delay(delay);
        self
    }

    pub fn skip_if<P>(self, predicate: P) -> Self
    where
        P: Fn(&ScheduledExecution) -> bool + Send + Sync + 'static,
    {
        self.skip_with(Arc::new(predicate))
    }

    pub fn skip_with(mut self, predicate: Arc<dyn SkipPredicate>) -> Self {
        self.skip = Some(predicate);
        self
    }

    /// Binds executions, and their continuations, to the event loop.
    pub fn non_blocking(mut self) -> Self {
        self.affinity = ExecutionAffinity::EventLoop;
        self
    }

    pub fn with_affinity(mut self, affinity: ExecutionAffinity) -> Self {
        self.affinity = affinity;
        self
    }

    pub fn with_concurrency(mut self, concurrency: ConcurrentExecution) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn identity(&self) -> &str {
        self.trigger.id()
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn affinity(&self) -> ExecutionAffinity {
        self.affinity
    }

    pub fn concurrency(&self) -> ConcurrentExecution {
        self.concurrency
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub fired: u64,
    pub skipped: u64,
    pub succeeded: u64,
    pub failed: u64,
}

struct JobState {
    job: ScheduledJob,
    paused: AtomicBool,
    running: AtomicUsize,
    fired: AtomicU64,
    last_fire: Mutex<Option<DateTime<Utc>>>,
    stats: Mutex<JobStats>,
}

impl JobState {
    fn new(job: ScheduledJob) -> Self {
        Self {
            job,
            paused: AtomicBool::new(false),
            running: AtomicUsize::new(0),
            fired: AtomicU64::new(0),
            last_fire: Mutex::new(None),
            stats: Mutex::new(JobStats::default()),
        }
    }

    fn record(&self, update: impl FnOnce(&mut JobStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut *stats);
    }

    fn stats(&self) -> JobStats {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct Scheduler {
    jobs: BTreeMap<String, Arc<JobState>>,
    events: Arc<EventBus>,
    enabled: bool,
    started: AtomicBool,
    paused: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    event_loop: Mutex<Option<EventLoop>>,
}

impl Scheduler {
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Spawns one trigger task per job on the current tokio runtime.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        if *self.shutdown.borrow() {
            return Err(SchedulerError::ShutDown);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyStarted);
        }
        if !self.enabled {
            info!("scheduler disabled, no triggers started");
            return Ok(());
        }

        let needs_event_loop = self
            .jobs
            .values()
            .any(|s| s.job.affinity == ExecutionAffinity::EventLoop);
        let event_loop = if needs_event_loop {
            let event_loop = EventLoop::start(EVENT_LOOP_THREAD_NAME)?;
            let handle = event_loop.handle()?;
            *self.event_loop.lock().unwrap_or_else(|e| e.into_inner()) = Some(event_loop);
            Some(handle)
        } else {
            None
        };

        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        for state in self.jobs.values() {
            let driver = TriggerDriver {
                state: Arc::clone(state),
                events: Arc::clone(&self.events),
                paused: Arc::clone(&self.paused),
                event_loop: event_loop.clone(),
                worker: runtime.clone(),
            };
            tasks.push(runtime.spawn(driver.run(self.shutdown.subscribe())));
        }

        info!(jobs = self.jobs.len(), "scheduler started");
        Ok(())
    }

    /// Whether triggers are firing: started, enabled, not paused and not shut down.
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst)
            && self.enabled
            && !self.paused.load(Ordering::SeqCst)
            && !*self.shutdown.borrow()
    }

    pub fn pause(&self, identity: &str) -> Result<(), SchedulerError> {
        self.state(identity)?.paused.store(true, Ordering::SeqCst);
        debug!(trigger = identity, "trigger paused");
        Ok(())
    }

    pub fn resume(&self, identity: &str) -> Result<(), SchedulerError> {
        self.state(identity)?.paused.store(false, Ordering::SeqCst);
        debug!(trigger = identity, "trigger resumed");
        Ok(())
    }

    pub fn is_paused(&self, identity: &str) -> Result<bool, SchedulerError> {
        Ok(self.state(identity)?.paused.load(Ordering::SeqCst))
    }

    pub fn pause_all(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume_all(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn identities(&self) -> Vec<&str> {
        self.jobs.keys().map(String::as_str).collect()
    }

    pub fn stats(&self, identity: &str) -> Result<JobStats, SchedulerError> {
        Ok(self.state(identity)?.stats())
    }

    pub fn all_stats(&self) -> BTreeMap<String, JobStats> {
        self.jobs
            .iter()
            .map(|(id, state)| (id.clone(), state.stats()))
            .collect()
    }

    /// Stops every trigger and the event loop.
    ///
    /// Executions already running on the worker pool are left to finish;
    /// executions still pending on the event loop are cancelled.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);

        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|e| e.into_inner()));
        for task in tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "trigger task ended abnormally");
            }
        }

        let event_loop = self
            .event_loop
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(mut event_loop) = event_loop {
            if let Err(err) = tokio::task::spawn_blocking(move || event_loop.shutdown()).await {
                warn!(error = %err, "failed to stop event loop");
            }
        }
        info!("scheduler stopped");
    }

    fn state(&self, identity: &str) -> Result<&Arc<JobState>, SchedulerError> {
        self.jobs
            .get(identity)
            .ok_or_else(|| SchedulerError::unknown_trigger(identity))
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

pub struct SchedulerBuilder {
    jobs: Vec<ScheduledJob>,
    event_capacity: usize,
    enabled: bool,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            enabled: true,
        }
    }

    pub fn with_job(mut self, job: ScheduledJob) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        let mut jobs = BTreeMap::new();
        for job in self.jobs {
            job.trigger().check_delay()?;
            let identity = job.identity().to_string();
            if jobs.contains_key(&identity) {
                return Err(SchedulerError::duplicate_identity(identity));
            }
            jobs.insert(identity, Arc::new(JobState::new(job)));
        }

        let (shutdown, _) = watch::channel(false);
        Ok(Scheduler {
            jobs,
            events: Arc::new(EventBus::new(self.event_capacity)),
            enabled: self.enabled,
            started: AtomicBool::new(false),
            paused: Arc::new(AtomicBool::new(false)),
            shutdown,
            tasks: Mutex::new(Vec::new()),
            event_loop: Mutex::new(None),
        })
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct TriggerDriver {
    state: Arc<JobState>,
    events: Arc<EventBus>,
    paused: Arc<AtomicBool>,
    event_loop: Option<EventLoopHandle>,
    worker: Handle,
}

impl TriggerDriver {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let trigger = self.state.job.trigger();
        let Some(first) = Instant::now().checked_add(trigger.delay()) else {
            warn!(trigger = trigger.id(), delay = ?trigger.delay(), "initial delay out of range, trigger not started");
            return;
        };
        let mut ticker = time::interval_at(first, trigger.every());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                scheduled = ticker.tick() => self.fire(scheduled),
            }
        }
        debug!(trigger = trigger.id(), "trigger stopped");
    }

    fn fire(&self, scheduled: Instant) {
        let state = &self.state;
        let identity = state.job.identity();
        if self.paused.load(Ordering::SeqCst) || state.paused.load(Ordering::SeqCst) {
            trace!(trigger = identity, "trigger paused, not firing");
            return;
        }

        let previous = *state.last_fire.lock().unwrap_or_else(|e| e.into_inner());
        let execution = ScheduledExecution::new(
            identity,
            state.fired.load(Ordering::SeqCst) + 1,
            wall_clock(scheduled),
            previous,
        );

        if let Some(predicate) = &state.job.skip {
            let skip = catch_unwind(AssertUnwindSafe(|| predicate.test(&execution)))
                .unwrap_or_else(|_| {
                    warn!(trigger = identity, "skip predicate panicked, firing anyway");
                    false
                });
            if skip {
                state.record(|s| s.skipped += 1);
                trace!(trigger = identity, "execution skipped by predicate");
                return;
            }
        }

        if state.job.concurrency == ConcurrentExecution::Skip
            && state.running.load(Ordering::SeqCst) > 0
        {
            state.record(|s| s.skipped += 1);
            debug!(trigger = identity, "previous execution still running, skipping");
            return;
        }

        state.fired.fetch_add(1, Ordering::SeqCst);
        state.running.fetch_add(1, Ordering::SeqCst);
        *state.last_fire.lock().unwrap_or_else(|e| e.into_inner()) = Some(execution.fire_time());
        state.record(|s| s.fired += 1);
        trace!(trigger = identity, sequence = execution.sequence(), "firing");

        let task = run_execution(Arc::clone(state), execution, Arc::clone(&self.events));
        match (&self.event_loop, state.job.affinity) {
            (Some(event_loop), ExecutionAffinity::EventLoop) => {
                if let Err(err) = event_loop.execute(task) {
                    state.running.fetch_sub(1, Ordering::SeqCst);
                    warn!(trigger = identity, error = %err, "could not dispatch to event loop");
                }
            }
            _ => {
                self.worker.spawn(task);
            }
        }
    }
}

async fn run_execution(state: Arc<JobState>, execution: ScheduledExecution, events: Arc<EventBus>) {
    let scope = RequestScope::new();
    let handler = Arc::clone(&state.job.handler);
    let completion = scope.run(complete(handler, execution.clone(), state.job.affinity));

    let result = match AssertUnwindSafe(completion).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(JobError::from_panic(payload.as_ref())),
    };

    // Scope ends before anyone hears about the outcome.
    let destroyed = scope.destroy();
    state.running.fetch_sub(1, Ordering::SeqCst);

    let identity = execution.trigger_id().to_string();
    match result {
        Ok(()) => {
            state.record(|s| s.succeeded += 1);
            debug!(trigger = %identity, sequence = execution.sequence(), destroyed, "execution succeeded");
            events.successful().publish(SuccessfulExecution::new(execution));
        }
        Err(error) => {
            state.record(|s| s.failed += 1);
            warn!(trigger = %identity, sequence = execution.sequence(), %error, "execution failed");
            events.failed().publish(FailedExecution::new(execution, error));
        }
    }
}

async fn complete(
    handler: Arc<dyn JobHandler>,
    execution: ScheduledExecution,
    affinity: ExecutionAffinity,
) -> Result<(), JobError> {
    let outcome = match affinity {
        ExecutionAffinity::EventLoop => handler.call(&execution)?,
        ExecutionAffinity::Worker => {
            let scope = RequestScope::current();
            tokio::task::spawn_blocking(move || match scope {
                Some(scope) => scope.run_sync(|| handler.call(&execution)),
                None => handler.call(&execution),
            })
            .await??
        }
    };

    match outcome {
        JobOutcome::Completed => Ok(()),
        JobOutcome::Future(future) => future.await,
        JobOutcome::Deferred(deferred) => deferred.subscribe().await,
    }
}

fn wall_clock(scheduled: Instant) -> DateTime<Utc> {
    let lag = Instant::now().saturating_duration_since(scheduled);
    Utc::now() - chrono::Duration::from_std(lag).unwrap_or_else(|_| chrono::Duration::zero())
}
