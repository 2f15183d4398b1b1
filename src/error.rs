//! Error types used by the batch engine and by caller callbacks.
//!
//! This module defines two main error enums:
//!
//! - [`RunError`]: terminal errors of one engine run (orchestration level).
//! - [`UnitError`]: errors raised by caller code: unit processing, flushes,
//!   chunk pulls and page-count lookups.
//!
//! A [`UnitError`] coming out of a unit or a flush is always absorbed by the
//! engine (counted and reported to observers). Only [`RunError`] ever escapes
//! [`BatchEngine::run`](crate::BatchEngine::run) and friends.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logs/metrics.

use std::fmt::Display;

use thiserror::Error;

use crate::core::RunResult;

/// # Errors that terminate an engine run.
///
/// Every variant produced after the run has started is surfaced only after
/// all outstanding flushes were drained; the drained counters are available
/// through [`RunError::totals`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// `chunk_size` was zero. Rejected before any callback is invoked.
    #[error("chunk size must be at least 1")]
    InvalidChunkSize,

    /// The work source could not be opened (e.g. the total page lookup failed).
    ///
    /// No unit has been processed and no flush has been scheduled.
    #[error("work source failed to open: {error}")]
    Open {
        /// Error returned by the source.
        error: UnitError,
    },

    /// The bootstrap page failed, so the total page count is unknown.
    ///
    /// The page is counted as one failed unit in `totals`.
    #[error("first page failed: {error}")]
    FirstPage {
        /// Error returned by the page callback.
        error: UnitError,
        /// Counters after drain.
        totals: RunResult,
    },

    /// Pulling the next chunk failed in the middle of a run.
    #[error("work source failed after {} units: {error}", .totals.attempted)]
    Source {
        /// Error returned by the source.
        error: UnitError,
        /// Counters after drain.
        totals: RunResult,
    },
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use batchvisor::RunError;
    ///
    /// assert_eq!(RunError::InvalidChunkSize.as_label(), "run_invalid_chunk_size");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::InvalidChunkSize => "run_invalid_chunk_size",
            RunError::Open { .. } => "run_open_failed",
            RunError::FirstPage { .. } => "run_first_page_failed",
            RunError::Source { .. } => "run_source_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RunError::InvalidChunkSize => "chunk size must be at least 1".to_string(),
            RunError::Open { error } => format!("open: {}", error.as_message()),
            RunError::FirstPage { error, .. } => format!("first page: {}", error.as_message()),
            RunError::Source { error, totals } => format!(
                "source: {} (attempted={})",
                error.as_message(),
                totals.attempted
            ),
        }
    }

    /// Counters drained before the error was surfaced, if the run got that far.
    pub fn totals(&self) -> Option<&RunResult> {
        match self {
            RunError::InvalidChunkSize | RunError::Open { .. } => None,
            RunError::FirstPage { totals, .. } | RunError::Source { totals, .. } => Some(totals),
        }
    }
}

/// # Errors produced by caller-supplied callbacks.
///
/// Panics inside callbacks are caught by the engine and reported as
/// [`UnitError::Panicked`], so a misbehaving unit never takes its siblings down.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// The callback returned an error.
    #[error("failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The callback panicked.
    #[error("panicked: {error}")]
    Panicked {
        /// Panic payload, if it was a string.
        error: String,
    },
}

impl UnitError {
    /// Builds a [`UnitError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use batchvisor::UnitError;
    ///
    /// let err = UnitError::fail("connection refused");
    /// assert_eq!(err.to_string(), "failed: connection refused");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        UnitError::Fail {
            error: error.to_string(),
        }
    }

    /// Builds a [`UnitError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let error = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        UnitError::Panicked { error }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            UnitError::Fail { .. } => "unit_failed",
            UnitError::Panicked { .. } => "unit_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            UnitError::Fail { error } => format!("error: {error}"),
            UnitError::Panicked { error } => format!("panic: {error}"),
        }
    }

    /// True if the error was produced by a caught panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, UnitError::Panicked { .. })
    }
}
