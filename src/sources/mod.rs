//! # Work sources.
//!
//! How chunks of work units are produced. The engine is one loop over
//! [`WorkSource`]; the variants differ only here.
//!
//! - [`FixedSource`] pre-materialized list, sliced by position (total known)
//! - [`CursorSource`] pull-based `fetch(size)` closure (total unknown unless given)
//! - [`PageRange`] known interval of pages derived from a base query
//! - [`PagedSource`] page-count lookup first, then pages `1..=total`

mod cursor;
mod fixed;
mod pages;
mod source;

pub use cursor::CursorSource;
pub use fixed::FixedSource;
pub use pages::{PageRange, PagedSource};
pub use source::WorkSource;
