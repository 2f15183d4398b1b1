//! # Progress observers.
//!
//! This module provides the [`Observe`] trait and built-in implementations.
//!
//! ## Architecture
//! ```text
//! Engine ── on_*(..) ──► ObserverSet ──► Observe::on_*(..)
//!                                           │
//!                                 ┌─────────┼─────────┐
//!                                 ▼         ▼         ▼
//!                             LogWriter  Metrics   Custom
//! ```
//!
//! ## Observer types
//! - **Passive observers** - react to notifications (logging, metrics, progress bars)
//! - **Composite** - [`ObserverSet`] fans out with panic isolation

#[cfg(feature = "logging")]
mod log;
mod observer;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observer::Observe;
pub use set::ObserverSet;
