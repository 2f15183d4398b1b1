//! # Unit processing callback.
//!
//! [`Process`] is the per-unit callback every variant needs. [`ProcessFn`]
//! wraps a closure `F: Fn(T) -> Fut`, producing a fresh future per unit.
//!
//! ## Concurrency semantics
//! - With a spawned unit executor, `process` is called concurrently from several tasks.
//! - No hidden mutation between calls; shared state goes behind `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use batchvisor::{ProcessFn, UnitError};
//!
//! let units = ProcessFn::arc(|id: u64| async move {
//!     if id == 0 {
//!         return Err(UnitError::fail("id 0 is reserved"));
//!     }
//!     Ok(())
//! });
//! # let _ = units;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UnitError;

/// Processes one work unit.
///
/// Errors and panics are absorbed by the engine: counted as failures and
/// reported through [`Observe::on_unit_fail`](crate::Observe::on_unit_fail).
#[async_trait]
pub trait Process<T>: Send + Sync + 'static {
    /// Processes `item`.
    async fn process(&self, item: T) -> Result<(), UnitError>;
}

/// Function-backed [`Process`] implementation.
pub struct ProcessFn<F> {
    f: F,
}

impl<F> ProcessFn<F> {
    /// Creates a new function-backed processor.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the processor and returns it behind an `Arc`.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, Fut> Process<T> for ProcessFn<F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    async fn process(&self, item: T) -> Result<(), UnitError> {
        (self.f)(item).await
    }
}
