//! # ObserverSet: fan-out over multiple observers
//!
//! [`ObserverSet`] forwards each notification to every observer in order,
//! synchronously, on the calling task.
//!
//! ## What it guarantees
//! - Per-observer call order matches the order the engine issued them on one task.
//! - Panics inside observers are caught and logged (isolation); the other
//!   observers still receive the notification.
//!
//! ## What it does **not** guarantee
//! - No ordering between notifications issued from different tasks.
//!
//! ## Diagram
//! ```text
//!    on_unit_success(7)
//!        │
//!        ├──► observer 1 (catch_unwind)
//!        ├──► observer 2 (catch_unwind)
//!        └──► observer N (catch_unwind)
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::core::{ChunkResult, RunResult};
use crate::error::{RunError, UnitError};
use crate::observers::Observe;

/// Composite observer with panic isolation.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn Observe>>,
}

impl ObserverSet {
    /// Creates a set from the given observers.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>) -> Self {
        Self { observers }
    }

    /// Adds one more observer.
    pub fn push(&mut self, observer: Arc<dyn Observe>) {
        self.observers.push(observer);
    }

    /// True if there are no observers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    fn each(&self, f: impl Fn(&dyn Observe)) {
        for observer in &self.observers {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))) {
                let info = UnitError::from_panic(panic);
                tracing::warn!(observer = observer.name(), error = %info, "observer panicked");
            }
        }
    }
}

impl Observe for ObserverSet {
    fn on_start(&self, total: Option<u64>) {
        self.each(|o| o.on_start(total));
    }

    fn on_batch_fetched(&self, batch: u64, size: usize) {
        self.each(|o| o.on_batch_fetched(batch, size));
    }

    fn on_unit_success(&self, index: u64) {
        self.each(|o| o.on_unit_success(index));
    }

    fn on_unit_fail(&self, index: u64, error: &UnitError) {
        self.each(|o| o.on_unit_fail(index, error));
    }

    fn on_batch_success(&self, chunk: &ChunkResult) {
        self.each(|o| o.on_batch_success(chunk));
    }

    fn on_batch_fail(&self, chunk: &ChunkResult, error: &UnitError) {
        self.each(|o| o.on_batch_fail(chunk, error));
    }

    fn on_complete(&self, totals: &RunResult) {
        self.each(|o| o.on_complete(totals));
    }

    fn on_error(&self, totals: &RunResult, error: &RunError) {
        self.each(|o| o.on_error(totals, error));
    }

    fn name(&self) -> &'static str {
        "ObserverSet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct Count(AtomicU64);

    impl Observe for Count {
        fn on_unit_success(&self, _index: u64) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicky;

    impl Observe for Panicky {
        fn on_unit_success(&self, _index: u64) {
            panic!("observer bug");
        }
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let before = Arc::new(Count::default());
        let after = Arc::new(Count::default());
        let observers: Vec<Arc<dyn Observe>> = vec![before.clone(), Arc::new(Panicky), after.clone()];
        let set = ObserverSet::new(observers);

        set.on_unit_success(1);
        set.on_unit_success(2);

        assert_eq!(before.0.load(Ordering::SeqCst), 2);
        assert_eq!(after.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_set() {
        let mut set = ObserverSet::default();
        assert!(set.is_empty());
        set.on_start(None);
        set.push(Arc::new(Count::default()));
        assert_eq!(set.len(), 1);
    }
}
