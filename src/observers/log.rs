//! # LogWriter: tracing-backed progress logger
//!
//! A minimal observer that writes every notification through `tracing`.
//! Install any `tracing` subscriber in the host application to see the output.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO batchvisor: [start] total=Some(120)
//! INFO batchvisor: [fetched] batch=1 size=10
//! WARN batchvisor: [unit-failed] index=7 err=failed: timeout
//! INFO batchvisor: [flushed] batch=1 succeeded=9 items_total=9
//! WARN batchvisor: [flush-failed] batch=2 err=failed: disk full
//! INFO batchvisor: [complete] attempted=120 succeeded=119 failed=1
//! ```

use crate::core::{ChunkResult, RunResult};
use crate::error::{RunError, UnitError};
use crate::observers::Observe;

/// Progress logger observer.
///
/// Unit successes are logged at `debug` to keep large runs readable.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Observe for LogWriter {
    fn on_start(&self, total: Option<u64>) {
        tracing::info!(target: "batchvisor", "[start] total={:?}", total);
    }

    fn on_batch_fetched(&self, batch: u64, size: usize) {
        tracing::info!(target: "batchvisor", "[fetched] batch={batch} size={size}");
    }

    fn on_unit_success(&self, index: u64) {
        tracing::debug!(target: "batchvisor", "[unit-ok] index={index}");
    }

    fn on_unit_fail(&self, index: u64, error: &UnitError) {
        tracing::warn!(target: "batchvisor", "[unit-failed] index={index} err={error}");
    }

    fn on_batch_success(&self, chunk: &ChunkResult) {
        tracing::info!(
            target: "batchvisor",
            "[flushed] batch={} succeeded={} items_total={}",
            chunk.batch,
            chunk.succeeded,
            chunk.items_total
        );
    }

    fn on_batch_fail(&self, chunk: &ChunkResult, error: &UnitError) {
        tracing::warn!(target: "batchvisor", "[flush-failed] batch={} err={error}", chunk.batch);
    }

    fn on_complete(&self, totals: &RunResult) {
        tracing::info!(
            target: "batchvisor",
            "[complete] attempted={} succeeded={} failed={}",
            totals.attempted,
            totals.succeeded,
            totals.failed
        );
    }

    fn on_error(&self, totals: &RunResult, error: &RunError) {
        tracing::error!(
            target: "batchvisor",
            label = error.as_label(),
            "[error] attempted={} err={error}",
            totals.attempted
        );
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tracing_subscriber::EnvFilter;

    use super::*;
    use crate::{BatchEngine, ExecutionPolicy, FlushFn, ProcessFn};

    #[tokio::test]
    async fn test_log_writer_through_a_run() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("batchvisor=debug"))
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let engine = BatchEngine::builder(ExecutionPolicy::default())
            .with_observer(Arc::new(LogWriter::new()))
            .build();
        let units = ProcessFn::arc(|id: u32| async move {
            if id == 2 {
                return Err(UnitError::fail("timeout"));
            }
            Ok(())
        });
        let flush = FlushFn::arc(|_chunk: ChunkResult| async { Ok::<_, UnitError>(()) });

        let totals = engine.run_list(1..=3_u32, units, flush, 2).await.unwrap();
        assert_eq!((totals.succeeded, totals.failed), (2, 1));
        assert_eq!(LogWriter::new().name(), "LogWriter");
    }
}
