//! Retry policy for write transactions.
//!
//! SQLite admits one writer at a time. When another connection holds the
//! write lock, a transaction is rolled back and re-run after a fixed pause,
//! up to a bounded number of attempts. Every transaction also carries a
//! deadline; work still running when it expires is interrupted.

use std::time::{Duration, Instant};

use rusqlite::ErrorCode;

/// Bounded retry-then-fail policy for store contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
    /// Wall-clock budget for one unit of work, retries included.
    pub deadline: Duration,
}

impl RetryPolicy {
    /// 10 attempts, 200 ms apart, 15 s per unit of work.
    pub const DEFAULT: Self = Self {
        max_attempts: 10,
        backoff: Duration::from_millis(200),
        deadline: Duration::from_secs(15),
    };

    pub fn new(max_attempts: u32, backoff: Duration, deadline: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            deadline,
        }
    }

    /// Whether another attempt may start, given the attempts made so far and
    /// when the unit of work began.
    pub fn should_retry(&self, attempts_made: u32, started: Instant) -> bool {
        attempts_made < self.max_attempts && started.elapsed() + self.backoff < self.deadline
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Lock contention: another connection holds the write lock.
pub fn is_contention(code: Option<ErrorCode>) -> bool {
    matches!(
        code,
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}

/// The progress handler aborted a statement because the deadline passed.
pub fn is_interrupted(code: Option<ErrorCode>) -> bool {
    matches!(code, Some(ErrorCode::OperationInterrupted))
}
