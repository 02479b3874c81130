//! Cooperative cancellation for running queries.
//!
//! A [`QueryContext`] is checked by the executor before each page fetch.
//! Clones share the cancellation flag, so any holder can stop the query; a
//! fetch that is already in flight is not interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::CancelReason;

/// Cancellation flag plus an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl QueryContext {
    /// A context that never stops on its own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop once `timeout` has elapsed from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Stop once `deadline` has passed. An earlier existing deadline wins.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    /// Signal cancellation to every clone of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// The configured deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Err` once the context has been cancelled or its deadline passed.
    pub fn check(&self) -> Result<(), CancelReason> {
        if self.is_cancelled() {
            return Err(CancelReason::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(CancelReason::DeadlineExceeded);
        }
        Ok(())
    }
}
