use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::JobError;

/// One firing of a trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledExecution {
    trigger_id: String,
    /// 1-based count of executions that actually fired for this trigger
    sequence: u64,
    fire_time: DateTime<Utc>,
    scheduled_fire_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_fire_time: Option<DateTime<Utc>>,
}

impl ScheduledExecution {
    pub fn new(
        trigger_id: impl Into<String>,
        sequence: u64,
        scheduled_fire_time: DateTime<Utc>,
        previous_fire_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            trigger_id: trigger_id.into(),
            sequence,
            fire_time: Utc::now(),
            scheduled_fire_time,
            previous_fire_time,
        }
    }

    pub fn trigger_id(&self) -> &str {
        &self.trigger_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn fire_time(&self) -> DateTime<Utc> {
        self.fire_time
    }

    pub fn scheduled_fire_time(&self) -> DateTime<Utc> {
        self.scheduled_fire_time
    }

    pub fn previous_fire_time(&self) -> Option<DateTime<Utc>> {
        self.previous_fire_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessfulExecution {
    pub execution: ScheduledExecution,
    pub completed_at: DateTime<Utc>,
}

impl SuccessfulExecution {
    pub fn new(execution: ScheduledExecution) -> Self {
        Self {
            execution,
            completed_at: Utc::now(),
        }
    }

    pub fn trigger_id(&self) -> &str {
        self.execution.trigger_id()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedExecution {
    pub execution: ScheduledExecution,
    pub error: JobError,
    pub failed_at: DateTime<Utc>,
}

impl FailedExecution {
    pub fn new(execution: ScheduledExecution, error: JobError) -> Self {
        Self {
            execution,
            error,
            failed_at: Utc::now(),
        }
    }

    pub fn trigger_id(&self) -> &str {
        self.execution.trigger_id()
    }
}
