//! # Work source abstraction.
//!
//! A [`WorkSource`] produces the chunks the engine processes. All variants of
//! the engine are the same loop over this trait; they differ only in the source.
//!
//! ## Contract
//! ```text
//! open()            once, before on_start      → total units if known
//! loop:
//!   is_exhausted()  → true  : stop
//!   next_chunk(n)   → empty : stop
//!                   → 1..=n units : process, flush
//! ```
//!
//! - `open` failing aborts the run before any unit is processed.
//! - `next_chunk` failing aborts the run after outstanding flushes are drained.
//! - `next_chunk` should return at most `size` units.

use async_trait::async_trait;

use crate::error::UnitError;

/// Producer of work-unit chunks.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use batchvisor::{UnitError, WorkSource};
///
/// /// Streams ids `1..=last` from an in-memory "cursor".
/// struct Ids { next: u64, last: u64 }
///
/// #[async_trait]
/// impl WorkSource for Ids {
///     type Item = u64;
///
///     async fn next_chunk(&mut self, size: usize) -> Result<Vec<u64>, UnitError> {
///         let end = (self.next + size as u64).min(self.last + 1);
///         let chunk: Vec<u64> = (self.next..end).collect();
///         self.next = end;
///         Ok(chunk)
///     }
///
///     fn is_exhausted(&self) -> bool {
///         self.next > self.last
///     }
/// }
/// ```
#[async_trait]
pub trait WorkSource: Send {
    /// Work unit handed to the unit callback.
    type Item: Send + 'static;

    /// Prepares the source and returns the total number of units, if known.
    ///
    /// `None` means "unknown", which is distinct from `Some(0)`.
    async fn open(&mut self) -> Result<Option<u64>, UnitError> {
        Ok(None)
    }

    /// Pulls the next chunk of at most `size` units; an empty chunk ends the run.
    async fn next_chunk(&mut self, size: usize) -> Result<Vec<Self::Item>, UnitError>;

    /// True once the source knows it has nothing left (saves one empty pull).
    fn is_exhausted(&self) -> bool {
        false
    }
}
