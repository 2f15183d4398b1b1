//! # Page-number sources.
//!
//! - [`PageRange`] enumerates a known interval of pages, deriving one query
//!   per page from a base query via [`PageQuery::with_page`].
//! - [`PagedSource`] first asks a [`PageCount`] for the total number of pages
//!   (exactly once, in `open`), then enumerates pages `1..=total`.
//!
//! ```text
//! PagedSource::open()
//!   └─► count.fetch_total_pages(base.with_page(1))   ── Err → run aborts, no page processed
//!         └─► PageRange { base, 1..=total }
//! next_chunk(n) → [base.with_page(p), base.with_page(p+1), ...]  (≤ n queries)
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UnitError;
use crate::sources::WorkSource;
use crate::units::{PageCount, PageQuery};

/// Known, inclusive interval of pages.
#[derive(Clone, Debug)]
pub struct PageRange<Q> {
    base: Q,
    next: u64,
    last: u64,
}

impl<Q: PageQuery> PageRange<Q> {
    /// Pages `first..=last`; empty if `first > last`.
    pub fn new(base: Q, first: u32, last: u32) -> Self {
        Self {
            base,
            next: u64::from(first),
            last: u64::from(last),
        }
    }

    /// Number of pages not yet handed out.
    pub fn remaining(&self) -> u64 {
        (self.last + 1).saturating_sub(self.next)
    }
}

#[async_trait]
impl<Q: PageQuery> WorkSource for PageRange<Q> {
    type Item = Q;

    async fn open(&mut self) -> Result<Option<u64>, UnitError> {
        Ok(Some(self.remaining()))
    }

    async fn next_chunk(&mut self, size: usize) -> Result<Vec<Q>, UnitError> {
        let end = self
            .next
            .saturating_add(size as u64)
            .min(self.last.saturating_add(1));
        let chunk = (self.next..end)
            // `end - 1 <= last <= u32::MAX`
            .map(|page| self.base.with_page(page as u32))
            .collect();
        self.next = end.max(self.next);
        Ok(chunk)
    }

    fn is_exhausted(&self) -> bool {
        self.next > self.last
    }
}

/// Two-phase page source: dedicated total-page lookup, then pages `1..=total`.
pub struct PagedSource<Q, C: ?Sized> {
    base: Q,
    count: Arc<C>,
    range: Option<PageRange<Q>>,
}

impl<Q, C> PagedSource<Q, C>
where
    Q: PageQuery,
    C: PageCount<Q> + ?Sized,
{
    /// Creates a source deriving page queries from `base`.
    pub fn new(base: Q, count: Arc<C>) -> Self {
        Self {
            base,
            count,
            range: None,
        }
    }
}

#[async_trait]
impl<Q, C> WorkSource for PagedSource<Q, C>
where
    Q: PageQuery,
    C: PageCount<Q> + ?Sized,
{
    type Item = Q;

    async fn open(&mut self) -> Result<Option<u64>, UnitError> {
        if let Some(range) = &self.range {
            return Ok(Some(range.remaining()));
        }
        let total = self.count.fetch_total_pages(self.base.with_page(1)).await?;
        self.range = Some(PageRange::new(self.base.clone(), 1, total));
        Ok(Some(u64::from(total)))
    }

    async fn next_chunk(&mut self, size: usize) -> Result<Vec<Q>, UnitError> {
        match &mut self.range {
            Some(range) => range.next_chunk(size).await,
            None => Ok(Vec::new()),
        }
    }

    fn is_exhausted(&self) -> bool {
        self.range.as_ref().is_some_and(|r| r.is_exhausted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{CountFn, IntPage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq)]
    struct Search {
        keyword: &'static str,
        page: u32,
    }

    impl PageQuery for Search {
        fn with_page(&self, page: u32) -> Self {
            Self {
                keyword: self.keyword,
                page,
            }
        }
        fn page(&self) -> u32 {
            self.page
        }
    }

    #[tokio::test]
    async fn test_range_derives_queries_from_base() {
        let base = Search {
            keyword: "rust",
            page: 99,
        };
        let mut range = PageRange::new(base.clone(), 2, 5);
        assert_eq!(range.open().await.unwrap(), Some(4));

        let chunk = range.next_chunk(3).await.unwrap();
        let pages: Vec<u32> = chunk.iter().map(PageQuery::page).collect();
        assert_eq!(pages, vec![2, 3, 4]);
        assert!(chunk.iter().all(|q| q.keyword == "rust"));

        assert_eq!(range.next_chunk(3).await.unwrap().len(), 1);
        assert!(range.is_exhausted());
        assert_eq!(base.page, 99, "base query untouched");
    }

    #[tokio::test]
    async fn test_empty_range() {
        let mut range = PageRange::new(IntPage(1), 1, 0);
        assert_eq!(range.open().await.unwrap(), Some(0));
        assert!(range.is_exhausted());
        assert!(range.next_chunk(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_range_up_to_max_page() {
        let mut range = PageRange::new(IntPage(1), u32::MAX - 1, u32::MAX);
        let chunk = range.next_chunk(8).await.unwrap();
        assert_eq!(chunk, vec![IntPage(u32::MAX - 1), IntPage(u32::MAX)]);
        assert!(range.is_exhausted());
    }

    #[tokio::test]
    async fn test_paged_source_counts_once_with_page_one() {
        let calls = Arc::new(AtomicUsize::new(0));
        let count = {
            let calls = calls.clone();
            CountFn::arc(move |q: IntPage| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert_eq!(q.page(), 1);
                    Ok::<_, UnitError>(3)
                }
            })
        };
        let mut src = PagedSource::new(IntPage(7), count);
        assert!(!src.is_exhausted());

        assert_eq!(src.open().await.unwrap(), Some(3));
        assert_eq!(src.open().await.unwrap(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(
            src.next_chunk(2).await.unwrap(),
            vec![IntPage(1), IntPage(2)]
        );
        assert_eq!(src.next_chunk(2).await.unwrap(), vec![IntPage(3)]);
        assert!(src.is_exhausted());
    }
}
