use std::sync::Arc;

use crate::{
    observers::{Observe, ObserverSet},
    policies::ExecutionPolicy,
};

use super::engine::BatchEngine;

/// Builder for constructing a [`BatchEngine`] with observers attached.
pub struct EngineBuilder {
    policy: ExecutionPolicy,
    observers: Vec<Arc<dyn Observe>>,
}

impl EngineBuilder {
    /// Creates a new builder with the given policy.
    pub fn new(policy: ExecutionPolicy) -> Self {
        Self {
            policy,
            observers: Vec::new(),
        }
    }

    /// Replaces the observer list.
    ///
    /// Observers are notified synchronously, in the given order. A panicking
    /// observer is logged and skipped; it never affects the run.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Appends one observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds the engine.
    pub fn build(self) -> BatchEngine {
        BatchEngine::with_observer_set(self.policy, ObserverSet::new(self.observers))
    }
}
