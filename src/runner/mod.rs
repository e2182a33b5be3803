pub mod filter;

pub use filter::TagFilter;

use crate::error::panic_message;
use crate::error::ResolutionError;
use crate::resolution::{
    Dispatcher, InvocationContext, ParameterDescriptor, ParameterResolver, ResolvedValue, Supplier,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

type TestBody = Box<dyn Fn(Arguments) -> anyhow::Result<()> + Send + Sync>;

/// Positional arguments handed to a test body. Each slot can be taken once.
#[derive(Debug)]
pub struct Arguments {
    values: Vec<Option<ResolvedValue>>,
}

impl Arguments {
    pub fn new(values: Vec<ResolvedValue>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value<T: 'static>(&mut self, index: usize) -> Result<T, ResolutionError> {
        self.take(index)?.into_value()
    }

    pub fn sequence<T: 'static>(&mut self, index: usize) -> Result<Vec<T>, ResolutionError> {
        self.take(index)?.into_sequence()
    }

    pub fn supplier<T: 'static>(&mut self, index: usize) -> Result<Supplier<T>, ResolutionError> {
        self.take(index)?.into_supplier()
    }

    fn take(&mut self, index: usize) -> Result<ResolvedValue, ResolutionError> {
        self.values
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| ResolutionError::missing_argument(index))
    }
}

pub struct TestCase {
    context: InvocationContext,
    parameters: Vec<ParameterDescriptor>,
    extensions: Vec<Arc<dyn ParameterResolver>>,
    body: TestBody,
}

impl TestCase {
    pub fn new<F>(id: impl Into<String>, body: F) -> Self
    where
        F: Fn(Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            context: InvocationContext::new(id),
            parameters: Vec::new(),
            extensions: Vec::new(),
            body: Box::new(body),
        }
    }

    pub fn with_parameter(mut self, param: ParameterDescriptor) -> Self {
        self.parameters.push(param);
        self
    }

    /// Registers a resolver for this case only, consulted after the invoker's own.
    pub fn extend_with<R: ParameterResolver + 'static>(mut self, resolver: R) -> Self {
        self.extensions.push(Arc::new(resolver));
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.context = self.context.with_tags([tag.into()]);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.context = self.context.with_display_name(name);
        self
    }

    pub fn id(&self) -> &str {
        self.context.test_id()
    }

    pub fn context(&self) -> &InvocationContext {
        &self.context
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed { message: String },
    ResolutionFailed(ResolutionError),
    Skipped { reason: String },
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub id: String,
    pub outcome: TestOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub results: Vec<TestResult>,
}

impl RunReport {
    fn record(&mut self, id: &str, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed { .. } => self.failed += 1,
            TestOutcome::ResolutionFailed(_) => self.errored += 1,
            TestOutcome::Skipped { .. } => self.skipped += 1,
        }
        self.results.push(TestResult {
            id: id.to_string(),
            outcome,
        });
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    pub fn outcome_of(&self, id: &str) -> Option<&TestOutcome> {
        self.results.iter().find(|r| r.id == id).map(|r| &r.outcome)
    }
}

/// Resolves each test's parameters just before calling it.
pub struct Invoker {
    dispatcher: Dispatcher,
    filter: TagFilter,
}

impl Invoker {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            filter: TagFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: TagFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn invoke(&self, case: &TestCase) -> TestOutcome {
        let tags: &BTreeSet<String> = case.context.tags();
        if let Some(reason) = self.filter.rejection(tags) {
            debug!(test = case.id(), %reason, "skipping test");
            return TestOutcome::Skipped { reason };
        }

        let dispatcher = self.dispatcher.with_extensions(&case.extensions);
        let values = match dispatcher.resolve_all(&case.parameters, &case.context) {
            Ok(values) => values,
            Err(err) => {
                warn!(test = case.id(), error = %err, "parameter resolution failed");
                return TestOutcome::ResolutionFailed(err);
            }
        };

        let args = Arguments::new(values);
        match catch_unwind(AssertUnwindSafe(|| (case.body)(args))) {
            Ok(Ok(())) => TestOutcome::Passed,
            Ok(Err(err)) => TestOutcome::Failed {
                message: format!("{err:#}"),
            },
            Err(payload) => TestOutcome::Failed {
                message: panic_message(payload.as_ref()),
            },
        }
    }

    pub fn run(&self, cases: &[TestCase]) -> RunReport {
        let mut report = RunReport::default();
        for case in cases {
            let outcome = self.invoke(case);
            report.record(case.id(), outcome);
        }
        info!(
            passed = report.passed,
            failed = report.failed,
            errored = report.errored,
            skipped = report.skipped,
            "test run finished"
        );
        report
    }
}
