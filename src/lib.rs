//! # batchvisor
//!
//! **Batchvisor** is a bounded-concurrency batch execution engine for Rust.
//!
//! It pulls work in chunks, runs every unit of a chunk (sequentially or on
//! spawned tasks), waits for the whole chunk, then hands a summary of it to a
//! caller-supplied flush that runs asynchronously, overlapping the next
//! chunk. A semaphore bounds how many flushes may be outstanding, so a slow
//! sink pushes back on the producer instead of letting work pile up.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌────────────────┐  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐
//!   │  FixedSource   │  │  CursorSource  │  │  PagedSource   │  │ first page of  │
//!   │ (id list)      │  │ (unknown size) │  │ (count + pages)│  │ run_pages_boot.│
//!   └───────┬────────┘  └───────┬────────┘  └───────┬────────┘  └───────┬────────┘
//!           └───────────────────┴──────── WorkSource ┴──────────────────┘
//!                                          ▼
//! ┌───────────────────────────────────────────────────────────────────────────────┐
//! │  BatchEngine (one chunk loop for every source)                                │
//! │  - ExecutionPolicy (unit executor, flush executor, flush bound, shutdown)     │
//! │  - ObserverSet (synchronous fan-out with panic isolation)                     │
//! └──────┬───────────────────────────────────────────────────────────┬────────────┘
//!        ▼                                                           ▼
//!  ┌──────────────────────────────┐                    ┌──────────────────────────┐
//!  │ units of chunk N             │   barrier          │ FlushQueue               │
//!  │ inline, or spawned (capped)  ├──────────────────► │ permit ◄── semaphore(k)  │
//!  │ errors/panics absorbed       │  ChunkResult       │ flush N ‖ units of N+1   │
//!  └──────────────────────────────┘                    └──────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! run(source, units, flush, chunk_size)
//!
//! chunk_size == 0 ─► Err(InvalidChunkSize)
//! open() ─► Err ─► on_error, Err(Open)
//! on_start(total?)
//! loop {
//!   ├─► shutdown requested?    ─► stop pulling (stopped_by_shutdown = true)
//!   ├─► next_chunk(chunk_size) ─► empty: stop, Err: remember failure
//!   ├─► run units, barrier
//!   └─► acquire flush permit, schedule flush
//! }
//! drain flushes ─► on_complete(totals) / on_error(totals, err)
//! ```
//!
//! ## Features
//! | Area             | Description                                                    | Key types / traits                                      |
//! |------------------|----------------------------------------------------------------|---------------------------------------------------------|
//! | **Engine**       | Chunk loop, barrier, bounded flushes, drain.                   | [`BatchEngine`], [`EngineBuilder`]                      |
//! | **Units**        | Caller callbacks as traits or closures.                        | [`Process`], [`Flush`], [`PageProcess`], [`PageCount`]  |
//! | **Sources**      | Where units come from.                                         | [`WorkSource`], [`FixedSource`], [`CursorSource`]       |
//! | **Pages**        | Page-numbered queries and page responses.                      | [`PageQuery`], [`IntPage`], [`PageInfo`]                |
//! | **Policies**     | Executors, flush bound and cooperative shutdown.               | [`ExecutionPolicy`], [`Executor`], [`ShutdownFlag`]     |
//! | **Observer API** | Progress callbacks (logging, metrics, custom observers).       | [`Observe`], [`ObserverSet`]                            |
//! | **Errors**       | Typed errors for runs and callbacks.                           | [`RunError`], [`UnitError`]                             |
//!
//! ## Optional features
//! - `logging` (default): exports a built-in [`LogWriter`] observer that writes through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use batchvisor::{
//!     BatchEngine, ChunkResult, ExecutionPolicy, Executor, FlushFn, IntPage, PageFn, PageInfo,
//!     PageQuery, UnitError,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = ExecutionPolicy::default()
//!         .with_unit_executor(Executor::spawn_limited(4))
//!         .with_max_pending_flushes(2);
//!
//!     // Build observers (optional)
//!     #[cfg(feature = "logging")]
//!     let observers: Vec<Arc<dyn batchvisor::Observe>> = vec![Arc::new(batchvisor::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let observers: Vec<Arc<dyn batchvisor::Observe>> = Vec::new();
//!
//!     let engine = BatchEngine::builder(policy).with_observers(observers).build();
//!
//!     // Every page reports the total page count; page 1 is fetched first to learn it.
//!     let pages = PageFn::arc(|q: IntPage| async move {
//!         let _page = q.page();
//!         Ok::<_, UnitError>(PageInfo::new(4, 40, 10))
//!     });
//!     let flush = FlushFn::arc(|chunk: ChunkResult| async move {
//!         println!("batch {} persisted ({} items so far)", chunk.batch, chunk.items_total);
//!         Ok::<_, UnitError>(())
//!     });
//!
//!     let totals = engine
//!         .run_pages_bootstrapped(IntPage::default(), pages, flush, 2)
//!         .await?;
//!     assert_eq!(totals.attempted, 4);
//!     assert_eq!(totals.items, 40);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod observers;
mod policies;
mod sources;
mod units;

// ---- Public re-exports ----

pub use core::{BatchEngine, ChunkResult, EngineBuilder, RunResult};
pub use error::{RunError, UnitError};
pub use observers::{Observe, ObserverSet};
pub use policies::{ExecutionPolicy, Executor, ShutdownFlag, ShutdownHook};
pub use sources::{CursorSource, FixedSource, PageRange, PagedSource, WorkSource};
pub use units::{
    CountFn, Flush, FlushFn, IntPage, PageCount, PageFn, PageInfo, PageProcess, PageQuery,
    Process, ProcessFn,
};

// Optional: expose a simple built-in logging observer.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use observers::LogWriter;
