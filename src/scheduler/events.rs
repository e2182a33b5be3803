/// Typed publish/subscribe for execution events.
///
/// Every event type gets its own `Topic`. Observers are called synchronously
/// on the publishing task, in registration order; subscribers receive clones
/// through a broadcast channel and may lag if they fall behind.
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::warn;

use super::execution::{FailedExecution, SuccessfulExecution};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Largest per-topic buffer; larger requests are clamped to it.
pub const MAX_EVENT_CAPACITY: usize = 65_536;

type Observer<E> = Arc<dyn Fn(&E) + Send + Sync>;

pub struct Topic<E> {
    name: &'static str,
    sender: broadcast::Sender<E>,
    observers: RwLock<Vec<Observer<E>>>,
}

impl<E: Clone + Send + 'static> Topic<E> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_EVENT_CAPACITY));
        Self {
            name,
            sender,
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.observers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(observer));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Delivers `event` to every observer and subscriber, returning how many saw it.
    pub fn publish(&self, event: E) -> usize {
        let observers: Vec<Observer<E>> = self
            .observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let mut delivered = 0;
        for observer in &observers {
            match catch_unwind(AssertUnwindSafe(|| observer(&event))) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(topic = self.name, "event observer panicked"),
            }
        }

        // No live receivers is not an error for a bus.
        delivered + self.sender.send(event).unwrap_or(0)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub struct EventBus {
    successful: Topic<SuccessfulExecution>,
    failed: Topic<FailedExecution>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            successful: Topic::new("successful_execution", capacity),
            failed: Topic::new("failed_execution", capacity),
        }
    }

    pub fn successful(&self) -> &Topic<SuccessfulExecution> {
        &self.successful
    }

    pub fn failed(&self) -> &Topic<FailedExecution> {
        &self.failed
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
