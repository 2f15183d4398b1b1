//! # Fixed-list source.
//!
//! [`FixedSource`] slices a pre-materialized sequence into chunks by position.
//! The total is known up front and reported to `on_start`.

use async_trait::async_trait;

use crate::error::UnitError;
use crate::sources::WorkSource;

/// Source over a finite, already known list of units (e.g. ids).
#[derive(Debug)]
pub struct FixedSource<T> {
    items: std::vec::IntoIter<T>,
    total: u64,
}

impl<T> FixedSource<T> {
    /// Creates a source over `items`, preserving their order.
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let items: Vec<T> = items.into_iter().collect();
        let total = items.len() as u64;
        Self {
            items: items.into_iter(),
            total,
        }
    }

    /// Units not yet handed out.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

#[async_trait]
impl<T: Send + 'static> WorkSource for FixedSource<T> {
    type Item = T;

    async fn open(&mut self) -> Result<Option<u64>, UnitError> {
        Ok(Some(self.total))
    }

    async fn next_chunk(&mut self, size: usize) -> Result<Vec<T>, UnitError> {
        Ok(self.items.by_ref().take(size).collect())
    }

    fn is_exhausted(&self) -> bool {
        self.items.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_positional_chunks_with_short_tail() {
        let mut src = FixedSource::new(1..=5);
        assert_eq!(src.open().await.unwrap(), Some(5));

        assert_eq!(src.next_chunk(2).await.unwrap(), vec![1, 2]);
        assert_eq!(src.next_chunk(2).await.unwrap(), vec![3, 4]);
        assert!(!src.is_exhausted());
        assert_eq!(src.next_chunk(2).await.unwrap(), vec![5]);
        assert!(src.is_exhausted());
        assert!(src.next_chunk(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_list() {
        let mut src = FixedSource::<String>::new(Vec::new());
        assert_eq!(src.open().await.unwrap(), Some(0));
        assert!(src.is_exhausted());
        assert_eq!(src.remaining(), 0);
    }
}
