use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::error::JobError;
use crate::scheduler::{JobOutcome, ScheduledExecution};

/// Built-in job bodies available from configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobAction {
    /// Logs a message and completes synchronously
    Log { message: String },
    /// Fails synchronously with the given message
    Fail { message: String },
    /// Completes through a future after `millis`, optionally failing
    Delay {
        millis: u64,
        #[serde(default)]
        fail: bool,
    },
}

impl JobAction {
    pub fn kind(&self) -> &'static str {
        match self {
            JobAction::Log { .. } => "log",
            JobAction::Fail { .. } => "fail",
            JobAction::Delay { .. } => "delay",
        }
    }

    pub fn run(&self, execution: &ScheduledExecution) -> Result<JobOutcome, JobError> {
        match self {
            JobAction::Log { message } => {
                info!(
                    trigger = execution.trigger_id(),
                    sequence = execution.sequence(),
                    "{message}"
                );
                Ok(JobOutcome::Completed)
            }
            JobAction::Fail { message } => Err(JobError::failed(message.clone())),
            JobAction::Delay { millis, fail } => {
                let (millis, fail) = (*millis, *fail);
                Ok(JobOutcome::future(async move {
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                    if fail {
                        Err(JobError::failed(format!("delayed failure after {millis}ms")))
                    } else {
                        Ok(())
                    }
                }))
            }
        }
    }
}
