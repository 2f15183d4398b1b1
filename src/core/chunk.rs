//! # Run the units of one chunk up to the barrier.
//!
//! [`run_chunk`] submits every unit of a chunk to the unit executor and
//! returns only when all of them have finished.
//!
//! ## Event flow
//! ```text
//! for item in chunk:
//!   index = counters.begin_unit()          (orchestrator, submission order)
//!   execute(item)                          (inline or spawned)
//!     ├─ Ok(items) → record_success → on_unit_success(index)
//!     └─ Err/panic → record_failure → on_unit_fail(index, err)
//! barrier: join every spawned unit
//! ```
//!
//! ## Rules
//! - One unit's error or panic never aborts its siblings.
//! - Every submitted unit is counted exactly once as success or failure.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::counters::RunCounters;
use crate::error::UnitError;
use crate::observers::{Observe, ObserverSet};
use crate::policies::Executor;
use crate::units::{PageProcess, Process};

/// Uniform view of a caller unit callback: returns the number of items it collected.
#[async_trait]
pub(crate) trait Unit<T>: Send + Sync + 'static {
    async fn execute(&self, item: T) -> Result<u64, UnitError>;
}

/// Plain units collect exactly one item each.
pub(crate) struct PlainUnits<U: ?Sized>(pub(crate) Arc<U>);

#[async_trait]
impl<T, U> Unit<T> for PlainUnits<U>
where
    T: Send + 'static,
    U: Process<T> + ?Sized,
{
    async fn execute(&self, item: T) -> Result<u64, UnitError> {
        self.0.process(item).await.map(|()| 1)
    }
}

/// Page units collect `item_count` items each.
pub(crate) struct PageUnits<P: ?Sized>(pub(crate) Arc<P>);

#[async_trait]
impl<Q, P> Unit<Q> for PageUnits<P>
where
    Q: Send + 'static,
    P: PageProcess<Q> + ?Sized,
{
    async fn execute(&self, item: Q) -> Result<u64, UnitError> {
        self.0.process_page(item).await.map(|info| info.item_count)
    }
}

/// Everything a unit needs to run and report, shared with spawned workers.
pub(crate) struct UnitContext<T> {
    pub(crate) units: Arc<dyn Unit<T>>,
    pub(crate) counters: Arc<RunCounters>,
    pub(crate) observers: Arc<ObserverSet>,
    pub(crate) executor: Executor,
    pub(crate) limiter: Option<Arc<Semaphore>>,
}

impl<T: Send + 'static> UnitContext<T> {
    pub(crate) fn new(
        units: Arc<dyn Unit<T>>,
        counters: Arc<RunCounters>,
        observers: Arc<ObserverSet>,
        executor: Executor,
    ) -> Self {
        let limiter = executor
            .concurrency_limit()
            .map(Semaphore::new)
            .map(Arc::new);
        Self {
            units,
            counters,
            observers,
            executor,
            limiter,
        }
    }
}

/// Per-chunk tally, read after the barrier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ChunkTally {
    pub(crate) attempted: usize,
    pub(crate) succeeded: usize,
}

/// Runs every unit of `items` and waits for all of them (barrier).
pub(crate) async fn run_chunk<T: Send + 'static>(items: Vec<T>, ctx: &UnitContext<T>) -> ChunkTally {
    let mut tally = ChunkTally {
        attempted: items.len(),
        succeeded: 0,
    };

    if ctx.executor.is_inline() {
        for item in items {
            let index = ctx.counters.begin_unit();
            if execute_unit(&ctx.units, item, index, &ctx.counters, &ctx.observers).await {
                tally.succeeded += 1;
            }
        }
        return tally;
    }

    let mut set = JoinSet::new();
    for item in items {
        let index = ctx.counters.begin_unit();
        let units = Arc::clone(&ctx.units);
        let counters = Arc::clone(&ctx.counters);
        let observers = Arc::clone(&ctx.observers);
        let limiter = ctx.limiter.clone();
        set.spawn(async move {
            let _permit = match limiter {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            execute_unit(&units, item, index, &counters, &observers).await
        });
    }

    while let Some(res) = set.join_next().await {
        match res {
            Ok(true) => tally.succeeded += 1,
            Ok(false) => {}
            Err(e) => {
                // The unit itself is panic-safe; only the task was lost.
                ctx.counters.record_failure();
                tracing::error!(error = %e, "unit task aborted");
            }
        }
    }
    tally
}

/// Executes one unit, records its outcome and notifies observers. Returns `true` on success.
async fn execute_unit<T: Send + 'static>(
    units: &Arc<dyn Unit<T>>,
    item: T,
    index: u64,
    counters: &RunCounters,
    observers: &ObserverSet,
) -> bool {
    let res = match AssertUnwindSafe(units.execute(item)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(UnitError::from_panic(panic)),
    };

    match res {
        Ok(items) => {
            counters.record_success(items);
            observers.on_unit_success(index);
            true
        }
        Err(e) => {
            counters.record_failure();
            observers.on_unit_fail(index, &e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{IntPage, PageFn, PageInfo, ProcessFn};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ctx<T: Send + 'static>(units: Arc<dyn Unit<T>>, executor: Executor) -> UnitContext<T> {
        UnitContext::new(
            units,
            Arc::new(RunCounters::new()),
            Arc::new(ObserverSet::default()),
            executor,
        )
    }

    #[tokio::test]
    async fn test_inline_failure_and_panic_do_not_abort_siblings() {
        let units = PlainUnits(ProcessFn::arc(|n: u32| async move {
            match n {
                2 => Err(UnitError::fail("bad unit")),
                3 => panic!("worse unit"),
                _ => Ok(()),
            }
        }));
        let ctx = ctx::<u32>(Arc::new(units), Executor::Inline);

        let tally = run_chunk(vec![1, 2, 3, 4], &ctx).await;
        assert_eq!(tally, ChunkTally { attempted: 4, succeeded: 2 });

        let snap = ctx.counters.snapshot();
        assert_eq!((snap.attempted, snap.succeeded, snap.failed), (4, 2, 2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_spawned_units_respect_concurrency_cap() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let units = {
            let (running, peak) = (running.clone(), peak.clone());
            PlainUnits(ProcessFn::arc(move |_n: u32| {
                let (running, peak) = (running.clone(), peak.clone());
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, UnitError>(())
                }
            }))
        };
        let ctx = ctx::<u32>(Arc::new(units), Executor::spawn_limited(3));

        let tally = run_chunk((0..12).collect(), &ctx).await;
        assert_eq!(tally.succeeded, 12);
        assert_eq!(running.load(Ordering::SeqCst), 0, "barrier waits for every unit");
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_page_units_count_items() {
        let units = PageUnits(PageFn::arc(|q: IntPage| async move {
            Ok::<_, UnitError>(PageInfo::new(3, 30, u64::from(q.0) + 10))
        }));
        let ctx = ctx::<IntPage>(Arc::new(units), Executor::spawn());

        run_chunk(vec![IntPage(1), IntPage(2)], &ctx).await;
        assert_eq!(ctx.counters.snapshot().items, 11 + 12);
    }
}
