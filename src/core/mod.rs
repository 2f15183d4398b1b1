//! Runtime core: the chunk loop, unit fan-out, flush backpressure and counters.
//!
//! The only public API from this module is [`BatchEngine`] (with its
//! [`EngineBuilder`]) and the result types it reports.
//!
//! Internal modules:
//! - [`engine`]: the run loop, page variants, drain and terminal reporting;
//! - [`chunk`]: executes one chunk of units with the barrier;
//! - [`flush`]: bounded queue of in-flight flushes;
//! - [`counters`]: shared run counters and result snapshots.

mod builder;
mod chunk;
mod counters;
mod engine;
mod flush;


pub use builder::EngineBuilder;
pub use counters::{ChunkResult, RunResult};
pub use engine::BatchEngine;
