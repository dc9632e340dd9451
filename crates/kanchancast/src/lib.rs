//! Order production-stage tracking for custom jewellery.
//!
//! Every order moves through a fixed catalog of production stages. The
//! [`OrderTracker`] provisions those stages, assigns employees to them,
//! records completion and keeps each order's progress and status in step.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod tracking;

pub use config::{load_config, load_config_from_str, Config};
pub use db::{Database, DatabaseError, DatabaseOptions, RetryPolicy};
pub use error::{ConfigError, Result, TrackerError};
pub use logging::init_logging;
pub use tracking::{
    AssignedTask, OrderFilter, OrderStatus, OrderSummary, OrderTracker, Progress, StageCatalog,
    StageView, StatusRepair, TrackerHandle, TrackerOptions, TrackingStage,
};
