use super::execution::ScheduledExecution;

/// Consulted before every firing; returning `true` suppresses it entirely.
pub trait SkipPredicate: Send + Sync {
    fn test(&self, execution: &ScheduledExecution) -> bool;
}

impl<F> SkipPredicate for F
where
    F: Fn(&ScheduledExecution) -> bool + Send + Sync,
{
    fn test(&self, execution: &ScheduledExecution) -> bool {
        self(execution)
    }
}

/// Skips every firing after `max_runs` executions have fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipAfter {
    max_runs: u64,
}

impl SkipAfter {
    pub fn new(max_runs: u64) -> Self {
        Self { max_runs }
    }
}

impl SkipPredicate for SkipAfter {
    fn test(&self, execution: &ScheduledExecution) -> bool {
        execution.sequence() > self.max_runs
    }
}
