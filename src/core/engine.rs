//! # BatchEngine: chunked unit processing with backpressured flushes.
//!
//! The [`BatchEngine`] drives one loop for every work source: pull a chunk,
//! fan its units out to the unit executor, wait for all of them (barrier),
//! schedule a flush behind a semaphore, repeat. When the source is exhausted
//! or shutdown is observed it drains every outstanding flush and reports.
//!
//! ## State machine
//! ```text
//! Idle ──run(chunk_size ≥ 1)──► Running ──exhausted / shutdown──► Draining ──► Completed
//!                                  │                                  ▲
//!                                  └──────────── source error ──────────┘──────► Failed
//! ```
//!
//! ## Loop
//! ```text
//! open() ─► on_start(total?)
//! loop {
//!   ├─► shutdown requested?        → exit (in-flight work always finishes)
//!   ├─► next_chunk(chunk_size)     → empty: exit, Err: Failed (after drain)
//!   ├─► on_batch_fetched
//!   ├─► run units (inline / spawned)
//!   ├─► barrier: join all units of this chunk
//!   ├─► acquire flush permit       ← backpressure (blocks, not cancellable)
//!   └─► spawn flush (does not wait for it)
//! }
//! drain: join every flush ─► on_complete(totals) | on_error(totals, err)
//! ```
//!
//! ## Rules
//! - Unit and flush errors are absorbed (counted, observed); they never end a run.
//! - Drain always happens before `run` returns, on success and on failure.
//! - Chunk N's flush may overlap chunk N+1's units; at most
//!   [`ExecutionPolicy::pending_flush_limit`] flushes execute at once.
//!
//! ## Example
//! ```rust
//! use batchvisor::{BatchEngine, ChunkResult, ExecutionPolicy, FixedSource, FlushFn, ProcessFn, UnitError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = BatchEngine::builder(ExecutionPolicy::default()).build();
//!
//!     let units = ProcessFn::arc(|id: u64| async move {
//!         if id == 3 {
//!             return Err(UnitError::fail("not found"));
//!         }
//!         Ok(())
//!     });
//!     let flush = FlushFn::arc(|_chunk: ChunkResult| async { Ok::<_, UnitError>(()) });
//!
//!     let totals = engine.run(FixedSource::new(1..=5_u64), units, flush, 10).await?;
//!     assert_eq!((totals.attempted, totals.succeeded, totals.failed), (5, 4, 1));
//!     assert_eq!(totals.batches, 1);
//!     Ok(())
//! }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::core::chunk::{ChunkTally, PageUnits, PlainUnits, Unit, UnitContext, run_chunk};
use crate::core::counters::{ChunkResult, RunCounters, RunResult, TotalKind};
use crate::core::flush::FlushQueue;
use crate::error::{RunError, UnitError};
use crate::observers::{Observe, ObserverSet};
use crate::policies::ExecutionPolicy;
use crate::sources::{FixedSource, PageRange, PagedSource, WorkSource};
use crate::units::{Flush, PageCount, PageProcess, PageQuery, Process};

use super::builder::EngineBuilder;

/// Runs batch workloads under one [`ExecutionPolicy`], reporting to a set of observers.
///
/// One engine can serve any number of runs, sequentially or concurrently;
/// every run owns its own counters and flush queue.
pub struct BatchEngine {
    policy: ExecutionPolicy,
    observers: Arc<ObserverSet>,
}

/// Lifecycle phase of a run, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Running,
    Draining,
    Completed,
    Failed,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Running => "running",
            Phase::Draining => "draining",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        }
    }
}

/// Why the loop stopped early; turned into a [`RunError`] once counters are drained.
enum Abort {
    Source(UnitError),
    FirstPage(UnitError),
}

impl Abort {
    fn into_error(self, totals: RunResult) -> RunError {
        match self {
            Abort::Source(error) => RunError::Source { error, totals },
            Abort::FirstPage(error) => RunError::FirstPage { error, totals },
        }
    }
}

/// Per-run state.
struct Run<T, F: ?Sized> {
    counters: Arc<RunCounters>,
    units: UnitContext<T>,
    flushes: FlushQueue<F>,
}

impl<T, F> Run<T, F>
where
    T: Send + 'static,
    F: Flush + ?Sized,
{
    async fn schedule_flush(&mut self, batch: u64, tally: ChunkTally) {
        let chunk = ChunkResult {
            batch,
            attempted: tally.attempted,
            succeeded: tally.succeeded,
            items_total: self.counters.items(),
        };
        self.flushes.schedule(chunk).await;
    }
}

impl BatchEngine {
    /// Creates an engine without observers.
    pub fn new(policy: ExecutionPolicy) -> Self {
        Self::with_observer_set(policy, ObserverSet::default())
    }

    /// Returns a builder to attach observers.
    pub fn builder(policy: ExecutionPolicy) -> EngineBuilder {
        EngineBuilder::new(policy)
    }

    pub(crate) fn with_observer_set(policy: ExecutionPolicy, observers: ObserverSet) -> Self {
        Self {
            policy,
            observers: Arc::new(observers),
        }
    }

    /// Policy this engine runs with.
    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    /// Requests shutdown of every run of this engine (and of everything sharing its flag).
    pub fn request_shutdown(&self) {
        self.policy.request_shutdown();
    }

    /// Runs the generic loop over any [`WorkSource`].
    ///
    /// Covers the fixed-list ([`FixedSource`]) and cursor
    /// ([`CursorSource`](crate::CursorSource)) variants as well as caller-defined sources.
    ///
    /// # Cancellation
    /// Prefer [`ShutdownFlag`](crate::ShutdownFlag) to stop a run. If the returned
    /// future is dropped instead (timeout, `select!`), flushes already spawned are
    /// detached and still run to completion, but no final report is emitted and
    /// units of the current chunk are abandoned.
    pub async fn run<S, U, F>(
        &self,
        source: S,
        units: Arc<U>,
        flush: Arc<F>,
        chunk_size: usize,
    ) -> Result<RunResult, RunError>
    where
        S: WorkSource,
        U: Process<S::Item> + ?Sized,
        F: Flush + ?Sized,
    {
        let units: Arc<dyn Unit<S::Item>> = Arc::new(PlainUnits(units));
        self.run_source(source, units, flush, chunk_size, TotalKind::Units)
            .await
    }

    /// Shorthand for [`BatchEngine::run`] over a [`FixedSource`].
    pub async fn run_list<T, I, U, F>(
        &self,
        items: I,
        units: Arc<U>,
        flush: Arc<F>,
        chunk_size: usize,
    ) -> Result<RunResult, RunError>
    where
        T: Send + 'static,
        I: IntoIterator<Item = T>,
        U: Process<T> + ?Sized,
        F: Flush + ?Sized,
    {
        self.run(FixedSource::new(items), units, flush, chunk_size)
            .await
    }

    /// Two-phase page variant: `count` is asked for the total page count exactly
    /// once, then pages `1..=total` are processed as units.
    ///
    /// If the count lookup fails no page is processed and
    /// [`RunError::Open`] is returned. A total of 0 completes immediately.
    pub async fn run_pages<Q, C, P, F>(
        &self,
        base: Q,
        count: Arc<C>,
        pages: Arc<P>,
        flush: Arc<F>,
        chunk_size: usize,
    ) -> Result<RunResult, RunError>
    where
        Q: PageQuery,
        C: PageCount<Q> + ?Sized,
        P: PageProcess<Q> + ?Sized,
        F: Flush + ?Sized,
    {
        let units: Arc<dyn Unit<Q>> = Arc::new(PageUnits(pages));
        self.run_source(
            PagedSource::new(base, count),
            units,
            flush,
            chunk_size,
            TotalKind::Pages,
        )
        .await
    }

    /// Bootstrap page variant: page 1 is processed first, on its own, to learn
    /// the total page count; pages `2..=total` then go through the generic loop.
    ///
    /// - `total_pages <= 1`: exactly one flush, the loop is never entered.
    /// - page 1 fails: counted as a failed unit, run ends with [`RunError::FirstPage`].
    pub async fn run_pages_bootstrapped<Q, P, F>(
        &self,
        base: Q,
        pages: Arc<P>,
        flush: Arc<F>,
        chunk_size: usize,
    ) -> Result<RunResult, RunError>
    where
        Q: PageQuery,
        P: PageProcess<Q> + ?Sized,
        F: Flush + ?Sized,
    {
        if chunk_size == 0 {
            return Err(RunError::InvalidChunkSize);
        }
        let units: Arc<dyn Unit<Q>> = Arc::new(PageUnits(Arc::clone(&pages)));
        let mut run = self.start_run(units, flush);

        if self.policy.is_shutdown_requested() {
            run.counters.mark_shutdown();
            self.observers.on_start(None);
            return self.finish(run, Ok(())).await;
        }

        let index = run.counters.begin_unit();
        let first = match AssertUnwindSafe(pages.process_page(base.with_page(1)))
            .catch_unwind()
            .await
        {
            Ok(res) => res,
            Err(panic) => Err(UnitError::from_panic(panic)),
        };
        let info = match first {
            Ok(info) => info,
            Err(e) => {
                run.counters.record_failure();
                self.observers.on_start(None);
                self.observers.on_unit_fail(index, &e);
                return self.finish(run, Err(Abort::FirstPage(e))).await;
            }
        };

        let total_pages = u64::from(info.total_pages);
        run.counters.record_success(info.item_count);
        run.counters.set_total(Some(total_pages), TotalKind::Pages);
        run.counters.set_total_items(info.total_items);
        self.observers.on_start(Some(total_pages));
        self.observers.on_unit_success(index);
        tracing::debug!(total_pages, total_items = info.total_items, "first page processed");

        let first_page_only = ChunkTally {
            attempted: 1,
            succeeded: 1,
        };
        if info.total_pages <= 1 {
            let batch = run.counters.next_batch();
            run.schedule_flush(batch, first_page_only).await;
            return self.finish(run, Ok(())).await;
        }

        let mut rest = PageRange::new(base, 2, info.total_pages);
        let outcome = self.drive(&mut rest, &mut run, chunk_size).await;
        // Page 1 rides with the first chunk's flush; flush it alone if no chunk ran.
        if run.counters.batches() == 0 {
            let batch = run.counters.next_batch();
            run.schedule_flush(batch, first_page_only).await;
        }
        self.finish(run, outcome).await
    }

    async fn run_source<S, F>(
        &self,
        mut source: S,
        units: Arc<dyn Unit<S::Item>>,
        flush: Arc<F>,
        chunk_size: usize,
        kind: TotalKind,
    ) -> Result<RunResult, RunError>
    where
        S: WorkSource,
        F: Flush + ?Sized,
    {
        if chunk_size == 0 {
            return Err(RunError::InvalidChunkSize);
        }

        let opened = match AssertUnwindSafe(source.open()).catch_unwind().await {
            Ok(res) => res,
            Err(panic) => Err(UnitError::from_panic(panic)),
        };
        let total = match opened {
            Ok(total) => total,
            Err(error) => {
                let err = RunError::Open { error };
                tracing::warn!(error = %err, "work source failed to open");
                self.observers.on_error(&RunResult::default(), &err);
                return Err(err);
            }
        };

        let mut run = self.start_run(units, flush);
        run.counters.set_total(total, kind);
        self.observers.on_start(total);

        let outcome = self.drive(&mut source, &mut run, chunk_size).await;
        self.finish(run, outcome).await
    }

    fn start_run<T, F>(&self, units: Arc<dyn Unit<T>>, flush: Arc<F>) -> Run<T, F>
    where
        T: Send + 'static,
        F: Flush + ?Sized,
    {
        let counters = Arc::new(RunCounters::new());
        let units = UnitContext::new(
            units,
            Arc::clone(&counters),
            Arc::clone(&self.observers),
            self.policy.unit_executor,
        );
        let flushes = FlushQueue::new(
            flush,
            self.policy.pending_flush_limit(),
            self.policy.flush_executor,
            Arc::clone(&self.observers),
            Arc::clone(&counters),
        );
        tracing::debug!(phase = Phase::Running.as_str(), "run started");
        Run {
            counters,
            units,
            flushes,
        }
    }

    /// The chunk loop. Returns when the source is exhausted, shutdown is
    /// observed, or the loop itself fails.
    async fn drive<S, F>(
        &self,
        source: &mut S,
        run: &mut Run<S::Item, F>,
        chunk_size: usize,
    ) -> Result<(), Abort>
    where
        S: WorkSource,
        F: Flush + ?Sized,
    {
        loop {
            if self.policy.is_shutdown_requested() {
                tracing::debug!("shutdown requested; no further chunks");
                run.counters.mark_shutdown();
                return Ok(());
            }
            if source.is_exhausted() {
                return Ok(());
            }

            let pulled = match AssertUnwindSafe(source.next_chunk(chunk_size))
                .catch_unwind()
                .await
            {
                Ok(res) => res,
                Err(panic) => Err(UnitError::from_panic(panic)),
            };
            let chunk = pulled.map_err(Abort::Source)?;
            if chunk.is_empty() {
                return Ok(());
            }

            let batch = run.counters.next_batch();
            tracing::debug!(batch, size = chunk.len(), "chunk pulled");
            self.observers.on_batch_fetched(batch, chunk.len());

            let tally = run_chunk(chunk, &run.units).await;
            run.schedule_flush(batch, tally).await;
        }
    }

    /// Drains every outstanding flush, then reports the terminal outcome.
    async fn finish<T, F>(
        &self,
        mut run: Run<T, F>,
        outcome: Result<(), Abort>,
    ) -> Result<RunResult, RunError>
    where
        T: Send + 'static,
        F: Flush + ?Sized,
    {
        tracing::debug!(phase = Phase::Draining.as_str(), "draining flushes");
        run.flushes.drain().await;
        let totals = run.counters.snapshot();

        match outcome {
            Ok(()) => {
                tracing::debug!(
                    phase = Phase::Completed.as_str(),
                    attempted = totals.attempted,
                    succeeded = totals.succeeded,
                    failed = totals.failed,
                    "run completed"
                );
                self.observers.on_complete(&totals);
                Ok(totals)
            }
            Err(abort) => {
                let err = abort.into_error(totals);
                tracing::warn!(
                    phase = Phase::Failed.as_str(),
                    label = err.as_label(),
                    error = %err,
                    "run failed"
                );
                self.observers.on_error(&totals, &err);
                Err(err)
            }
        }
    }
}
