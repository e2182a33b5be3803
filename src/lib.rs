//! paramflow
//!
//! Typed parameter resolution for test-style invocations, and a periodic job
//! scheduler that publishes a completion event for every execution.
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod resolution;
pub mod runner;
pub mod scheduler;

pub use error::{Error, Result};
pub use resolution::{
    Dispatcher, InvocationContext, MatchPolicy, ParameterDescriptor, ParameterResolver,
    ResolvedValue, Supplier,
};
pub use runner::{Invoker, RunReport, TagFilter, TestCase, TestOutcome};
pub use scheduler::{
    Deferred, EventBus, FailedExecution, JobOutcome, RequestScope, ScheduledExecution,
    ScheduledJob, Scheduler, SkipPredicate, SuccessfulExecution,
};
