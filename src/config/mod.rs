pub mod actions;
pub mod loader;

pub use actions::JobAction;
pub use loader::{load_config, load_path};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ConfigError, SchedulerError};
use crate::scheduler::{
    parse_delay, ConcurrentExecution, ScheduledJob, Scheduler, SkipAfter, Trigger,
    DEFAULT_EVENT_CAPACITY, MAX_EVENT_CAPACITY,
};

fn default_enabled() -> bool {
    true
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            event_capacity: default_event_capacity(),
            jobs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub identity: String,
    pub every: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    #[serde(default)]
    pub non_blocking: bool,

    #[serde(default)]
    pub concurrent_execution: ConcurrentExecution,

    /// Skip every firing once this many executions have fired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runs: Option<u64>,

    pub action: JobAction,
}

impl JobConfig {
    pub fn to_job(&self) -> Result<ScheduledJob, SchedulerError> {
        let mut trigger = Trigger::parse(&self.identity, &self.every)?;
        if let Some(delay) = &self.delay {
            trigger = trigger.with_delay(parse_delay(delay)?);
        }

        let action = self.action.clone();
        let mut job = ScheduledJob::new(trigger, move |execution| action.run(execution))
            .with_concurrency(self.concurrent_execution);
        if self.non_blocking {
            job = job.non_blocking();
        }
        if let Some(max_runs) = self.max_runs {
            job = job.skip_with(Arc::new(SkipAfter::new(max_runs)));
        }
        Ok(job)
    }
}

impl SchedulerConfig {
    /// Checks the event capacity, that identities are unique and that every period parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_EVENT_CAPACITY).contains(&self.event_capacity) {
            return Err(ConfigError::invalid(format!(
                "event_capacity must be between 1 and {MAX_EVENT_CAPACITY}, got {}",
                self.event_capacity
            )));
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !seen.insert(job.identity.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "duplicate job identity '{}'",
                    job.identity
                )));
            }
            job.to_job()
                .map_err(|e| ConfigError::invalid(format!("job '{}': {e}", job.identity)))?;
        }
        Ok(())
    }

    /// Folds `other` into `self`: jobs are appended, a disabled side disables both.
    pub fn merge(&mut self, other: SchedulerConfig) {
        self.enabled &= other.enabled;
        self.event_capacity = self.event_capacity.max(other.event_capacity);
        self.jobs.extend(other.jobs);
    }

    pub fn build_scheduler(&self) -> crate::error::Result<Scheduler> {
        self.validate()?;
        let mut builder = Scheduler::builder()
            .enabled(self.enabled)
            .with_event_capacity(self.event_capacity);
        for job in &self.jobs {
            builder = builder.with_job(job.to_job()?);
        }
        Ok(builder.build()?)
    }
}
