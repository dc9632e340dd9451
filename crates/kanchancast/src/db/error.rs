//! Failures of the storage layer.

use std::path::PathBuf;
use std::time::Duration;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Everything the store can fail with.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Could not create the directory holding the database file.
    #[error("Cannot prepare database location '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema migration v{version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// A thread panicked while holding the connection.
    #[error("Connection mutex poisoned by a panicked thread")]
    LockPoisoned,

    /// The store stayed locked by another writer for every retry attempt.
    #[error("Database unavailable: still locked after {attempts} attempts")]
    Busy { attempts: u32 },

    /// The transaction did not finish before its deadline and was rolled back.
    #[error("Transaction timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

impl DatabaseError {
    /// Whether the failure is caused by write contention or a deadline and may
    /// succeed if the caller tries again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy { .. } | Self::Timeout { .. })
    }
}

/// Access to the SQLite failure buried inside a higher-level error, so the
/// transaction retry loop can tell lock contention apart from real failures.
pub trait SqliteFailure {
    fn sqlite_code(&self) -> Option<ErrorCode>;
}

impl SqliteFailure for DatabaseError {
    fn sqlite_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Sqlite(e) => e.sqlite_error_code(),
            _ => None,
        }
    }
}
