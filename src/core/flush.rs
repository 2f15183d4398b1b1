//! # Backpressured flush scheduling.
//!
//! [`FlushQueue`] owns the admission semaphore and every outstanding flush of
//! one run.
//!
//! ## Flow
//! ```text
//! schedule(chunk)
//!   ├─► reap finished flushes (try_join_next)
//!   ├─► acquire permit            ← blocks while max_pending_flushes are in flight
//!   └─► FlushTicket { permit, chunk }
//!         ├─ Spawn  → JoinSet::spawn(run_ticket)   (returns immediately)
//!         └─ Inline → run_ticket.await
//!
//! run_ticket
//!   ├─► flush.flush(chunk)  (panic caught)
//!   ├─► on_batch_success / on_batch_fail
//!   └─► drop(permit)
//!
//! drain()
//!   └─► join every remaining flush task
//! ```
//!
//! ## Rules
//! - At most `limit` flushes execute at once (one permit each).
//! - A permit is released exactly once, on every path (RAII).
//! - Flush errors and panics never reach the orchestrator.
//! - Dropping the queue (e.g. the run future was dropped) detaches spawned
//!   flushes instead of aborting them; they still run to completion.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::core::counters::{ChunkResult, RunCounters};
use crate::error::UnitError;
use crate::observers::{Observe, ObserverSet};
use crate::policies::Executor;
use crate::units::Flush;

/// Permit plus the chunk snapshot it was acquired for.
///
/// Alive only while its flush runs; dropping it releases the permit.
struct FlushTicket {
    chunk: ChunkResult,
    _permit: Option<OwnedSemaphorePermit>,
}

/// Outstanding flushes of one run.
pub(crate) struct FlushQueue<F: ?Sized> {
    flush: Arc<F>,
    semaphore: Arc<Semaphore>,
    executor: Executor,
    inflight: JoinSet<()>,
    observers: Arc<ObserverSet>,
    counters: Arc<RunCounters>,
}

impl<F> FlushQueue<F>
where
    F: Flush + ?Sized,
{
    pub(crate) fn new(
        flush: Arc<F>,
        limit: usize,
        executor: Executor,
        observers: Arc<ObserverSet>,
        counters: Arc<RunCounters>,
    ) -> Self {
        Self {
            flush,
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
            executor,
            inflight: JoinSet::new(),
            observers,
            counters,
        }
    }

    /// Waits for a permit, then starts the flush of `chunk`.
    ///
    /// Returns once the flush is scheduled (spawned executor) or finished
    /// (inline executor). The permit wait is not cancellable.
    pub(crate) async fn schedule(&mut self, chunk: ChunkResult) {
        self.reap();

        // The queue holds the only handle to the semaphore and never closes it.
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();
        let ticket = FlushTicket {
            chunk,
            _permit: permit,
        };
        tracing::debug!(batch = chunk.batch, in_flight = self.inflight.len(), "flush scheduled");

        let job = run_ticket(
            Arc::clone(&self.flush),
            ticket,
            Arc::clone(&self.observers),
            Arc::clone(&self.counters),
        );
        if self.executor.is_inline() {
            job.await;
        } else {
            self.inflight.spawn(job);
        }
    }

    /// Waits until every scheduled flush has finished, whatever its outcome.
    pub(crate) async fn drain(&mut self) {
        while let Some(res) = self.inflight.join_next().await {
            if let Err(e) = res {
                tracing::error!(error = %e, "flush task aborted");
            }
        }
    }

    /// Number of flush tasks not yet joined.
    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    fn reap(&mut self) {
        while let Some(res) = self.inflight.try_join_next() {
            if let Err(e) = res {
                tracing::error!(error = %e, "flush task aborted");
            }
        }
    }
}

impl<F: ?Sized> Drop for FlushQueue<F> {
    fn drop(&mut self) {
        if !self.inflight.is_empty() {
            tracing::warn!(in_flight = self.inflight.len(), "run dropped before drain; detaching flushes");
            self.inflight.detach_all();
        }
    }
}

async fn run_ticket<F>(
    flush: Arc<F>,
    ticket: FlushTicket,
    observers: Arc<ObserverSet>,
    counters: Arc<RunCounters>,
) where
    F: Flush + ?Sized,
{
    let chunk = ticket.chunk;
    let res = match AssertUnwindSafe(flush.flush(chunk)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(UnitError::from_panic(panic)),
    };

    match res {
        Ok(()) => observers.on_batch_success(&chunk),
        Err(e) => {
            counters.record_flush_failure();
            tracing::debug!(batch = chunk.batch, error = %e, "flush failed");
            observers.on_batch_fail(&chunk, &e);
        }
    }
    drop(ticket);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::FlushFn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn chunk(batch: u64) -> ChunkResult {
        ChunkResult {
            batch,
            ..ChunkResult::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_limit_bounds_concurrent_flushes() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let flush = {
            let (running, peak) = (running.clone(), peak.clone());
            FlushFn::arc(move |_c: ChunkResult| {
                let (running, peak) = (running.clone(), peak.clone());
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, UnitError>(())
                }
            })
        };
        let counters = Arc::new(RunCounters::new());
        let mut queue = FlushQueue::new(
            flush,
            2,
            Executor::spawn(),
            Arc::new(ObserverSet::default()),
            counters.clone(),
        );

        for b in 1..=6 {
            queue.schedule(chunk(b)).await;
        }
        queue.drain().await;

        assert_eq!(running.load(Ordering::SeqCst), 0);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(queue.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_panicking_flush_releases_permit() {
        let flush = FlushFn::arc(|c: ChunkResult| async move {
            if c.batch == 1 {
                panic!("flush bug");
            }
            Ok::<_, UnitError>(())
        });
        let counters = Arc::new(RunCounters::new());
        let mut queue = FlushQueue::new(
            flush,
            1,
            Executor::spawn(),
            Arc::new(ObserverSet::default()),
            counters.clone(),
        );

        queue.schedule(chunk(1)).await;
        // Would wait forever if the panicking flush kept its permit.
        tokio::time::timeout(Duration::from_secs(1), queue.schedule(chunk(2)))
            .await
            .expect("permit released");
        queue.drain().await;

        assert_eq!(counters.snapshot().flush_failures, 1);
    }

    #[tokio::test]
    async fn test_inline_flush_finishes_before_schedule_returns() {
        let done = Arc::new(AtomicUsize::new(0));
        let flush = {
            let done = done.clone();
            FlushFn::arc(move |_c: ChunkResult| {
                let done = done.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, UnitError>(())
                }
            })
        };
        let mut queue = FlushQueue::new(
            flush,
            3,
            Executor::Inline,
            Arc::new(ObserverSet::default()),
            Arc::new(RunCounters::new()),
        );

        queue.schedule(chunk(1)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(queue.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_dropped_queue_lets_flushes_finish() {
        let done = Arc::new(AtomicUsize::new(0));
        let flush = {
            let done = done.clone();
            FlushFn::arc(move |_c: ChunkResult| {
                let done = done.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, UnitError>(())
                }
            })
        };
        let mut queue = FlushQueue::new(
            flush,
            2,
            Executor::spawn(),
            Arc::new(ObserverSet::default()),
            Arc::new(RunCounters::new()),
        );

        queue.schedule(chunk(1)).await;
        queue.schedule(chunk(2)).await;
        drop(queue);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }
}
