//! # Where units and flushes run.
//!
//! [`Executor`] selects how the engine drives a piece of caller work:
//!
//! - [`Executor::Inline`] the orchestrating task awaits the work itself, one
//!   piece at a time (sequential; default for units).
//! - [`Executor::Spawn`] every piece is a separate `tokio::spawn`ed task,
//!   optionally capped by a concurrency limit (default for flushes).
//!
//! ## Sentinel values
//! - `Spawn { max_concurrent: 0 }` → unlimited (no unit semaphore created)

/// Execution facility for units or flushes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Executor {
    /// Await the work on the orchestrating task.
    ///
    /// Use when:
    /// - Work must not overlap (rate-limited remote, single connection)
    /// - Deterministic ordering helps debugging
    Inline,

    /// Spawn the work onto the tokio runtime.
    ///
    /// - `max_concurrent = 0` → unlimited
    /// - `max_concurrent = n` → at most `n` pieces in flight at once
    Spawn {
        /// Concurrency cap for spawned work (`0` = unlimited).
        max_concurrent: usize,
    },
}

impl Executor {
    /// Spawned executor without a concurrency cap.
    pub const fn spawn() -> Self {
        Executor::Spawn { max_concurrent: 0 }
    }

    /// Spawned executor capped at `n` concurrent pieces of work.
    pub const fn spawn_limited(n: usize) -> Self {
        Executor::Spawn { max_concurrent: n }
    }

    /// Returns the concurrency cap as an `Option`.
    ///
    /// - `None` → no cap (inline work is naturally sequential)
    /// - `Some(n)` → at most `n` spawned pieces in flight
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        match *self {
            Executor::Inline => None,
            Executor::Spawn { max_concurrent: 0 } => None,
            Executor::Spawn { max_concurrent } => Some(max_concurrent),
        }
    }

    /// True for [`Executor::Inline`].
    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self, Executor::Inline)
    }
}

impl Default for Executor {
    /// Returns [`Executor::Inline`].
    fn default() -> Self {
        Executor::Inline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_limit_sentinels() {
        assert_eq!(Executor::Inline.concurrency_limit(), None);
        assert_eq!(Executor::spawn().concurrency_limit(), None);
        assert_eq!(Executor::spawn_limited(8).concurrency_limit(), Some(8));
    }

    #[test]
    fn test_default_is_inline() {
        assert!(Executor::default().is_inline());
        assert!(!Executor::spawn().is_inline());
    }
}
