//! # Chunk persistence callback.
//!
//! [`Flush`] persists whatever the units of one chunk produced. The engine
//! only schedules and bounds flushes; what is stored and where is up to the caller.
//!
//! A flush may still be running while the next chunk's units are processed,
//! and two flushes may complete in either order.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::ChunkResult;
use crate::error::UnitError;

/// Persists one completed chunk.
///
/// Failures are reported through [`Observe::on_batch_fail`](crate::Observe::on_batch_fail)
/// and counted in [`RunResult::flush_failures`](crate::RunResult::flush_failures);
/// they are never retried and never stop the run.
#[async_trait]
pub trait Flush: Send + Sync + 'static {
    /// Persists the chunk described by `chunk`.
    async fn flush(&self, chunk: ChunkResult) -> Result<(), UnitError>;
}

/// Function-backed [`Flush`] implementation.
///
/// ## Example
/// ```rust
/// use batchvisor::{ChunkResult, FlushFn, UnitError};
///
/// let flush = FlushFn::arc(|chunk: ChunkResult| async move {
///     // write buffered rows...
///     let _ = chunk.batch;
///     Ok::<_, UnitError>(())
/// });
/// # let _ = flush;
/// ```
pub struct FlushFn<F> {
    f: F,
}

impl<F> FlushFn<F> {
    /// Creates a new function-backed flush.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the flush and returns it behind an `Arc`.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Flush for FlushFn<F>
where
    F: Fn(ChunkResult) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    async fn flush(&self, chunk: ChunkResult) -> Result<(), UnitError> {
        (self.f)(chunk).await
    }
}
