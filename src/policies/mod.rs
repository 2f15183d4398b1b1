//! Execution policies.
//!
//! This module groups the knobs that control **where** caller work runs,
//! **how much** persistence may be outstanding and **when** a run stops early.
//!
//! ## Contents
//! - [`ExecutionPolicy`] the bundle handed to the engine
//! - [`Executor`] inline vs spawned execution (units and flushes)
//! - [`ShutdownFlag`] one-way flag polled between chunks
//! - [`ShutdownHook`] requests shutdown on many flags (optionally on OS signal)
//!
//! ## Defaults
//! - units inline, flushes spawned, `max_pending_flushes = 3`, shutdown never requested.

mod execution;
mod executor;
mod shutdown;

pub use execution::ExecutionPolicy;
pub use executor::Executor;
pub use shutdown::{ShutdownFlag, ShutdownHook};
