//! # Execution policy for one engine.
//!
//! Provides [`ExecutionPolicy`], the capability bundle every run is driven by:
//! unit executor, flush executor, flush backpressure bound and shutdown flag.
//!
//! ## Sentinel values
//! - `max_pending_flushes = 0` → treated as 1 (at least one flush may be in flight)
//! - `unit_executor = Spawn { max_concurrent: 0 }` → no unit concurrency cap

use crate::policies::{Executor, ShutdownFlag};

/// Configuration of one [`BatchEngine`](crate::BatchEngine).
///
/// ## Field semantics
/// - `unit_executor`: How units of one chunk are run (default inline, i.e. sequential)
/// - `flush_executor`: How flushes are run (default spawned, overlapping the next chunk)
/// - `max_pending_flushes`: Bound on concurrently outstanding flushes (default 3)
/// - `shutdown`: Flag polled between chunks (default: never requested)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct ExecutionPolicy {
    /// Executor for unit processing.
    pub unit_executor: Executor,

    /// Executor for flushes.
    ///
    /// With [`Executor::Inline`] the orchestrator runs each flush itself while
    /// holding its permit, so chunk processing and persistence never overlap.
    pub flush_executor: Executor,

    /// Maximum number of flushes that may be outstanding at once.
    ///
    /// The orchestrator blocks on a permit before scheduling a flush once this
    /// many are in flight. The wait is not cancellable.
    pub max_pending_flushes: usize,

    /// Shutdown flag, polled between chunks.
    pub shutdown: ShutdownFlag,
}

impl ExecutionPolicy {
    /// Returns the flush bound clamped to a minimum of 1.
    #[inline]
    pub fn pending_flush_limit(&self) -> usize {
        self.max_pending_flushes.max(1)
    }

    /// Snapshot of the shutdown flag.
    #[inline]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_requested()
    }

    /// One-way shutdown request; observable through [`Self::is_shutdown_requested`].
    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }

    /// Replaces the unit executor.
    #[must_use]
    pub fn with_unit_executor(mut self, executor: Executor) -> Self {
        self.unit_executor = executor;
        self
    }

    /// Replaces the flush executor.
    #[must_use]
    pub fn with_flush_executor(mut self, executor: Executor) -> Self {
        self.flush_executor = executor;
        self
    }

    /// Replaces the flush bound.
    #[must_use]
    pub fn with_max_pending_flushes(mut self, n: usize) -> Self {
        self.max_pending_flushes = n;
        self
    }

    /// Replaces the shutdown flag (e.g. with one registered in a [`ShutdownHook`](crate::ShutdownHook)).
    #[must_use]
    pub fn with_shutdown(mut self, flag: ShutdownFlag) -> Self {
        self.shutdown = flag;
        self
    }
}

impl Default for ExecutionPolicy {
    /// Default policy:
    ///
    /// - `unit_executor = Executor::Inline` (sequential)
    /// - `flush_executor = Executor::spawn()` (async, overlaps next chunk)
    /// - `max_pending_flushes = 3`
    /// - `shutdown` never requested
    fn default() -> Self {
        Self {
            unit_executor: Executor::Inline,
            flush_executor: Executor::spawn(),
            max_pending_flushes: 3,
            shutdown: ShutdownFlag::new(),
        }
    }
}
