use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::db::{DatabaseError, SqliteFailure};

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Unknown stage '{stage}': not one of the production stages")]
    UnknownStage { stage: String },

    #[error("Employee {employee_id} works in '{work_area}' and cannot be assigned to '{stage}'")]
    WorkAreaMismatch {
        employee_id: i64,
        work_area: String,
        stage: String,
    },

    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Employee {0} not found")]
    EmployeeNotFound(i64),

    #[error("Employee {employee_id} still holds {active_assignments} open stage assignment(s)")]
    ReferentialConflict {
        employee_id: i64,
        active_assignments: u64,
    },

    #[error("Store failure: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl TrackerError {
    /// Store contention or a missed deadline; the whole unit of work was
    /// rolled back and may be retried later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(e) if e.is_transient())
    }

    /// Caller supplied something the tracker refuses to store.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnknownStage { .. } | Self::WorkAreaMismatch { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::OrderNotFound(_) | Self::EmployeeNotFound(_))
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::Sqlite(e))
    }
}

impl SqliteFailure for TrackerError {
    fn sqlite_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Database(e) => e.sqlite_code(),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config is not valid JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Invalid config: {message}")]
    Validation { message: String },

    #[error("Config does not match schema: {errors}")]
    SchemaValidation { errors: String },
}

pub type Result<T> = std::result::Result<T, TrackerError>;
