//! # Caller-supplied callbacks.
//!
//! This module provides the traits the engine calls back into:
//! - [`Process`] - processes one unit ([`ProcessFn`] closure wrapper)
//! - [`Flush`] - persists one completed chunk ([`FlushFn`] closure wrapper)
//! - [`PageProcess`] / [`PageCount`] - page variants ([`PageFn`], [`CountFn`])
//! - [`PageQuery`] / [`IntPage`] / [`PageInfo`] - page query and page result types

mod flush;
mod page;
mod process;

pub use flush::{Flush, FlushFn};
pub use page::{CountFn, IntPage, PageCount, PageFn, PageInfo, PageProcess, PageQuery};
pub use process::{Process, ProcessFn};
