//! # Page-based work units.
//!
//! Page variants treat a *query* as the work unit: one query per page number,
//! all derived from a caller-supplied base query.
//!
//! - [`PageQuery`] immutable query with a page number; [`PageQuery::with_page`] derives a new one.
//! - [`IntPage`] query holding nothing but the page number.
//! - [`PageInfo`] what processing one page reports back.
//! - [`PageProcess`] processes one page ([`PageFn`] closure wrapper).
//! - [`PageCount`] looks up the total page count ([`CountFn`] closure wrapper).
//!
//! ## Example
//! ```rust
//! use batchvisor::PageQuery;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct ArticleSearch {
//!     keyword: String,
//!     page: u32,
//! }
//!
//! impl PageQuery for ArticleSearch {
//!     fn with_page(&self, page: u32) -> Self {
//!         Self { keyword: self.keyword.clone(), page }
//!     }
//!     fn page(&self) -> u32 {
//!         self.page
//!     }
//! }
//!
//! let base = ArticleSearch { keyword: "rust".into(), page: 1 };
//! let third = base.with_page(3);
//! assert_eq!(third.page(), 3);
//! assert_eq!(third.keyword, "rust");
//! assert_eq!(base.page(), 1);
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UnitError;

/// Immutable page query.
///
/// `with_page` never mutates the receiver: it returns a new value with the
/// same filter fields and only the page number changed, so queries derived
/// concurrently for different pages stay independent.
pub trait PageQuery: Clone + Send + Sync + 'static {
    /// Returns a copy of this query pointing at `page` (1-based).
    fn with_page(&self, page: u32) -> Self;

    /// Page number this query points at.
    fn page(&self) -> u32;
}

/// Query holding only a page number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntPage(pub u32);

impl PageQuery for IntPage {
    fn with_page(&self, page: u32) -> Self {
        IntPage(page)
    }

    fn page(&self) -> u32 {
        self.0
    }
}

impl Default for IntPage {
    /// Page 1.
    fn default() -> Self {
        IntPage(1)
    }
}

/// Result of processing one page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Total number of pages of the whole result set.
    pub total_pages: u32,
    /// Total number of items of the whole result set.
    pub total_items: u64,
    /// Items collected from this page.
    pub item_count: u64,
}

impl PageInfo {
    /// Creates a page info.
    pub const fn new(total_pages: u32, total_items: u64, item_count: u64) -> Self {
        Self {
            total_pages,
            total_items,
            item_count,
        }
    }
}

/// Processes one page.
#[async_trait]
pub trait PageProcess<Q>: Send + Sync + 'static {
    /// Fetches and processes the page `query` points at.
    async fn process_page(&self, query: Q) -> Result<PageInfo, UnitError>;
}

/// Looks up the total number of pages.
///
/// Kept apart from [`PageProcess`]: the count may come from a different
/// backing query (e.g. a `/count` endpoint) than the pages themselves.
#[async_trait]
pub trait PageCount<Q>: Send + Sync + 'static {
    /// Returns the total page count for `query` (which points at page 1).
    async fn fetch_total_pages(&self, query: Q) -> Result<u32, UnitError>;
}

/// Function-backed [`PageProcess`] implementation.
pub struct PageFn<F> {
    f: F,
}

impl<F> PageFn<F> {
    /// Creates a new function-backed page processor.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the page processor and returns it behind an `Arc`.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<Q, F, Fut> PageProcess<Q> for PageFn<F>
where
    Q: Send + 'static,
    F: Fn(Q) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PageInfo, UnitError>> + Send + 'static,
{
    async fn process_page(&self, query: Q) -> Result<PageInfo, UnitError> {
        (self.f)(query).await
    }
}

/// Function-backed [`PageCount`] implementation.
pub struct CountFn<F> {
    f: F,
}

impl<F> CountFn<F> {
    /// Creates a new function-backed page count lookup.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the lookup and returns it behind an `Arc`.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<Q, F, Fut> PageCount<Q> for CountFn<F>
where
    Q: Send + 'static,
    F: Fn(Q) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<u32, UnitError>> + Send + 'static,
{
    async fn fetch_total_pages(&self, query: Q) -> Result<u32, UnitError> {
        (self.f)(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_page_with_page_is_pure() {
        let base = IntPage::default();
        let fifth = base.with_page(5);
        assert_eq!(base, IntPage(1));
        assert_eq!(fifth.page(), 5);
    }

    #[tokio::test]
    async fn test_fn_wrappers_forward() {
        let pages = PageFn::new(|q: IntPage| async move {
            Ok::<_, UnitError>(PageInfo::new(4, 40, u64::from(q.page()) * 10))
        });
        let info = pages.process_page(IntPage(3)).await.unwrap();
        assert_eq!(info, PageInfo::new(4, 40, 30));

        let count = CountFn::new(|_q: IntPage| async { Err::<u32, _>(UnitError::fail("no count")) });
        let err = count.fetch_total_pages(IntPage(1)).await.unwrap_err();
        assert_eq!(err, UnitError::fail("no count"));
    }
}
