use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::cli::OutputFormat;
use crate::scheduler::{FailedExecution, JobStats, SuccessfulExecution};

/// One completion event as printed by `paramflow run`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub status: &'static str,
    pub trigger: String,
    pub sequence: u64,
    pub fire_time: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SuccessfulExecution> for EventRecord {
    fn from(event: &SuccessfulExecution) -> Self {
        Self {
            status: "succeeded",
            trigger: event.trigger_id().to_string(),
            sequence: event.execution.sequence(),
            fire_time: event.execution.fire_time(),
            finished_at: event.completed_at,
            error: None,
        }
    }
}

impl From<&FailedExecution> for EventRecord {
    fn from(event: &FailedExecution) -> Self {
        Self {
            status: "failed",
            trigger: event.trigger_id().to_string(),
            sequence: event.execution.sequence(),
            fire_time: event.execution.fire_time(),
            finished_at: event.failed_at,
            error: Some(event.error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub duration_ms: u128,
    pub total_succeeded: u64,
    pub total_failed: u64,
    pub total_skipped: u64,
    pub jobs: BTreeMap<String, JobStats>,
}

impl RunSummary {
    pub fn new(duration: std::time::Duration, jobs: BTreeMap<String, JobStats>) -> Self {
        Self {
            duration_ms: duration.as_millis(),
            total_succeeded: jobs.values().map(|s| s.succeeded).sum(),
            total_failed: jobs.values().map(|s| s.failed).sum(),
            total_skipped: jobs.values().map(|s| s.skipped).sum(),
            jobs,
        }
    }
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn event(record: &EventRecord, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string(record)?),
            OutputFormat::Text => {
                let mut line = format!(
                    "[{}] {} #{} {}",
                    record.finished_at.format("%H:%M:%S%.3f"),
                    record.trigger,
                    record.sequence,
                    record.status
                );
                if let Some(error) = &record.error {
                    write!(line, ": {error}")?;
                }
                Ok(line)
            }
        }
    }

    pub fn summary(summary: &RunSummary, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
            OutputFormat::Text => {
                let mut out = String::new();
                writeln!(
                    out,
                    "ran {} job(s) for {}ms: {} succeeded, {} failed, {} skipped",
                    summary.jobs.len(),
                    summary.duration_ms,
                    summary.total_succeeded,
                    summary.total_failed,
                    summary.total_skipped
                )?;
                for (identity, stats) in &summary.jobs {
                    writeln!(
                        out,
                        "  {identity}: fired={} succeeded={} failed={} skipped={}",
                        stats.fired, stats.succeeded, stats.failed, stats.skipped
                    )?;
                }
                Ok(out.trim_end().to_string())
            }
        }
    }
}
