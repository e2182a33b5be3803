/// Lazy single-value completion handle.
///
/// Nothing attached with `invoke` or `and_then` runs when the handle is
/// built; continuations run in order once the scheduler subscribes, after the
/// handler itself has returned, on the execution's context and inside its
/// request scope.
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;

use crate::error::JobError;

type Continuation = Box<dyn FnOnce() -> Result<(), JobError> + Send>;

enum Source {
    Item,
    Failure(JobError),
    Pending(BoxFuture<'static, Result<(), JobError>>),
}

pub struct Deferred {
    source: Source,
    continuations: Vec<Continuation>,
}

impl Deferred {
    /// Completes with no value as soon as it is subscribed.
    pub fn void() -> Self {
        Self::with_source(Source::Item)
    }

    pub fn failure(error: JobError) -> Self {
        Self::with_source(Source::Failure(error))
    }

    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        Self::with_source(Source::Pending(Box::pin(future)))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            continuations: Vec::new(),
        }
    }

    /// Runs `callback` after the source completes successfully.
    pub fn invoke<F>(self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.and_then(move || {
            callback();
            Ok(())
        })
    }

    /// Like `invoke`, but the callback may fail the handle.
    pub fn and_then<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() -> Result<(), JobError> + Send + 'static,
    {
        self.continuations.push(Box::new(callback));
        self
    }

    pub async fn subscribe(self) -> Result<(), JobError> {
        match self.source {
            Source::Item => {}
            Source::Failure(error) => return Err(error),
            Source::Pending(future) => future.await?,
        }
        for continuation in self.continuations {
            continuation()?;
        }
        Ok(())
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            Source::Item => "item",
            Source::Failure(_) => "failure",
            Source::Pending(_) => "pending",
        };
        f.debug_struct("Deferred")
            .field("source", &source)
            .field("continuations", &self.continuations.len())
            .finish()
    }
}
