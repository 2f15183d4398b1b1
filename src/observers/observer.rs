//! # Observe: progress notifications
//!
//! The [`Observe`] trait is the main **extension point** for watching a run.
//! The engine calls it at fixed points of the batch loop; nothing an observer
//! does (or returns) changes control flow.
//!
//! Implementing your own observer allows you to plug in:
//! - progress bars and structured logging;
//! - metrics export;
//! - test probes.
//!
//! # Call sequence
//! ```text
//! on_start(total?)
//!   loop per chunk:
//!     on_batch_fetched(batch, size)
//!     on_unit_success(index) | on_unit_fail(index, err)     (any order, any task)
//!     on_batch_success(chunk) | on_batch_fail(chunk, err)   (from the flush task, later)
//! on_complete(totals) | on_error(totals, err)               (exactly one, after drain)
//! ```
//!
//! ## Rules
//! - Unit and flush notifications may arrive **concurrently** from several tasks.
//! - `index` is the 1-based ordinal of the unit in the run; for page variants it equals the page number.
//! - A panicking observer is isolated by [`ObserverSet`](crate::ObserverSet) and logged.
//!
//! # Example: custom observer
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use batchvisor::{Observe, UnitError};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicU64);
//!
//! impl Observe for FailureCounter {
//!     fn on_unit_fail(&self, _index: u64, _error: &UnitError) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```

use crate::core::{ChunkResult, RunResult};
use crate::error::{RunError, UnitError};

/// Progress callbacks invoked by the engine.
///
/// Every method has a no-op default; implement only what you need.
#[allow(unused_variables)]
pub trait Observe: Send + Sync + 'static {
    /// Run started. `None` means the total is unknown (distinct from `Some(0)`).
    fn on_start(&self, total: Option<u64>) {}

    /// A chunk of `size` units was pulled from the source.
    fn on_batch_fetched(&self, batch: u64, size: usize) {}

    /// Unit `index` succeeded.
    fn on_unit_success(&self, index: u64) {}

    /// Unit `index` failed.
    fn on_unit_fail(&self, index: u64, error: &UnitError) {}

    /// Flush of `chunk` succeeded.
    fn on_batch_success(&self, chunk: &ChunkResult) {}

    /// Flush of `chunk` failed.
    fn on_batch_fail(&self, chunk: &ChunkResult, error: &UnitError) {}

    /// Run finished normally (exhausted or stopped by shutdown), after drain.
    fn on_complete(&self, totals: &RunResult) {}

    /// Run failed, after drain.
    fn on_error(&self, totals: &RunResult, error: &RunError) {}

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
