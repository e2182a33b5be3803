use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;

use super::deferred::Deferred;
use super::execution::ScheduledExecution;
use crate::error::JobError;

/// What a job handler hands back to the scheduler.
pub enum JobOutcome {
    /// The job finished synchronously
    Completed,
    /// Completion is signalled by an already-running future
    Future(BoxFuture<'static, Result<(), JobError>>),
    /// Lazy single-value handle, subscribed by the scheduler after the call returns
    Deferred(Deferred),
}

impl JobOutcome {
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        Self::Future(Box::pin(future))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JobOutcome::Completed => "completed",
            JobOutcome::Future(_) => "future",
            JobOutcome::Deferred(_) => "deferred",
        }
    }
}

impl fmt::Debug for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobOutcome::{}", self.kind())
    }
}

impl From<Deferred> for JobOutcome {
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(deferred)
    }
}

pub trait JobHandler: Send + Sync {
    fn call(&self, execution: &ScheduledExecution) -> Result<JobOutcome, JobError>;
}

impl<F> JobHandler for F
where
    F: Fn(&ScheduledExecution) -> Result<JobOutcome, JobError> + Send + Sync,
{
    fn call(&self, execution: &ScheduledExecution) -> Result<JobOutcome, JobError> {
        self(execution)
    }
}
