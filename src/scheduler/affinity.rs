/// Where an execution runs.
///
/// Non-blocking jobs are bound to a single event-loop thread that drives its
/// own current-thread tokio runtime. Everything else is called on the
/// blocking worker pool of the scheduler's runtime.
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::future::Future;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::SchedulerError;

thread_local! {
    static ON_EVENT_LOOP: Cell<bool> = const { Cell::new(false) };
}

/// Whether the calling code runs on an event-loop thread.
pub fn is_on_event_loop() -> bool {
    ON_EVENT_LOOP.with(Cell::get)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionAffinity {
    #[default]
    Worker,
    EventLoop,
}

type Task = BoxFuture<'static, ()>;

#[derive(Clone)]
pub struct EventLoopHandle {
    sender: mpsc::UnboundedSender<Task>,
}

impl EventLoopHandle {
    pub fn execute<F>(&self, task: F) -> Result<(), SchedulerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.sender
            .send(Box::pin(task))
            .map_err(|_| SchedulerError::event_loop("event loop has stopped"))
    }
}

pub struct EventLoop {
    name: String,
    sender: Option<mpsc::UnboundedSender<Task>>,
    thread: Option<JoinHandle<()>>,
}

impl EventLoop {
    pub fn start(name: impl Into<String>) -> Result<Self, SchedulerError> {
        let name = name.into();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SchedulerError::event_loop(e.to_string()))?;
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();

        let thread = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                ON_EVENT_LOOP.with(|flag| flag.set(true));
                runtime.block_on(async move {
                    while let Some(task) = receiver.recv().await {
                        tokio::spawn(task);
                    }
                });
            })
            .map_err(|e| SchedulerError::event_loop(e.to_string()))?;

        debug!(event_loop = %name, "event loop started");
        Ok(Self {
            name,
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> Result<EventLoopHandle, SchedulerError> {
        self.sender
            .clone()
            .map(|sender| EventLoopHandle { sender })
            .ok_or_else(|| SchedulerError::event_loop("event loop has stopped"))
    }

    /// Stops accepting work and waits for the thread to exit.
    ///
    /// The thread exits once every outstanding `EventLoopHandle` is dropped;
    /// tasks still pending at that point are cancelled.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(event_loop = %self.name, "event loop thread panicked");
            }
            debug!(event_loop = %self.name, "event loop stopped");
        }
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        // Detach rather than join: dropping may happen on an async task.
        self.sender.take();
    }
}
