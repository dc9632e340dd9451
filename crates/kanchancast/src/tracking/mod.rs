//! Production-stage tracking for custom orders.
//!
//! [`OrderTracker`] is the synchronous entry point and [`TrackerHandle`]
//! wraps it for async callers. The remaining modules hold the pieces each
//! operation is built from and take a plain connection, so several of them
//! can share one transaction.

pub mod assignment;
pub mod catalog;
pub mod completion;
pub mod delivery;
pub mod handle;
pub mod progress;
pub mod provisioner;
pub mod read_model;
pub mod repair;
pub mod status;
pub mod tracker;

pub use assignment::AssignmentPolicy;
pub use catalog::{StageCatalog, STANDARD_ALIASES, STANDARD_STAGES};
pub use delivery::{DurationUnit, LeadTime};
pub use handle::TrackerHandle;
pub use progress::Progress;
pub use read_model::{AssignedTask, OrderFilter, OrderSummary, StageView, TrackingStage, UNASSIGNED};
pub use repair::StatusRepair;
pub use status::OrderStatus;
pub use tracker::{OrderTracker, TrackerOptions};
