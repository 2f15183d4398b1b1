//! # Cursor source (unknown size).
//!
//! [`CursorSource`] pulls chunks on demand from a caller closure
//! `FnMut(usize) -> Fut`, e.g. a DB cursor or a scroll API. A short chunk is
//! fine; an empty chunk signals exhaustion. The total is unknown unless the
//! caller supplies it with [`CursorSource::with_total`].
//!
//! ## Example
//! ```rust
//! use batchvisor::{CursorSource, UnitError};
//!
//! let mut rows = (1..=10_u64).collect::<Vec<_>>().into_iter();
//! let source = CursorSource::new(move |size: usize| {
//!     let chunk: Vec<u64> = rows.by_ref().take(size).collect();
//!     async move { Ok::<_, UnitError>(chunk) }
//! });
//! # let _ = source;
//! ```

use std::future::Future;

use async_trait::async_trait;

use crate::error::UnitError;
use crate::sources::WorkSource;

/// Pull-based source with (by default) unknown total size.
pub struct CursorSource<F> {
    fetch: F,
    total: Option<u64>,
    exhausted: bool,
}

impl<F> CursorSource<F> {
    /// Creates a cursor source around `fetch(size)`.
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            total: None,
            exhausted: false,
        }
    }

    /// Declares the total number of units, for progress reporting only.
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

#[async_trait]
impl<T, F, Fut> WorkSource for CursorSource<F>
where
    T: Send + 'static,
    F: FnMut(usize) -> Fut + Send,
    Fut: Future<Output = Result<Vec<T>, UnitError>> + Send + 'static,
{
    type Item = T;

    async fn open(&mut self) -> Result<Option<u64>, UnitError> {
        Ok(self.total)
    }

    async fn next_chunk(&mut self, size: usize) -> Result<Vec<T>, UnitError> {
        if self.exhausted {
            return Ok(Vec::new());
        }
        let chunk = (self.fetch)(size).await?;
        if chunk.is_empty() {
            self.exhausted = true;
        }
        Ok(chunk)
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_empty_chunk_exhausts_and_stops_fetching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut src = {
            let calls = calls.clone();
            CursorSource::new(move |_size: usize| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<Vec<u32>, UnitError>(Vec::new()) }
            })
        };

        assert_eq!(src.open().await.unwrap(), None);
        assert!(src.next_chunk(4).await.unwrap().is_empty());
        assert!(src.is_exhausted());
        assert!(src.next_chunk(4).await.unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_chunk_is_not_exhaustion() {
        let mut batches = vec![vec![1, 2, 3], vec![4]].into_iter();
        let mut src = CursorSource::new(move |_size: usize| {
            let next = batches.next().unwrap_or_default();
            async move { Ok::<_, UnitError>(next) }
        })
        .with_total(4);

        assert_eq!(src.open().await.unwrap(), Some(4));
        assert_eq!(src.next_chunk(3).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(src.next_chunk(3).await.unwrap(), vec![4]);
        assert!(!src.is_exhausted());
        assert!(src.next_chunk(3).await.unwrap().is_empty());
        assert!(src.is_exhausted());
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let mut src = CursorSource::new(|_size: usize| async {
            Err::<Vec<u32>, _>(UnitError::fail("cursor closed"))
        });
        assert_eq!(
            src.next_chunk(1).await.unwrap_err(),
            UnitError::fail("cursor closed")
        );
    }
}
