//! Status repair for orders whose stored status disagrees with their progress.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::status::OrderStatus;
use crate::db::order_repo;
use crate::error::Result;

/// What to do when a stored status disagrees with stored progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusRepair {
    /// Write the derived status back to the order and return it.
    #[default]
    Persist,
    /// Return the derived status but leave the stored row untouched.
    Report,
    /// Return the stored status as is; only unreadable values are replaced
    /// by the derived one.
    Off,
}

impl StatusRepair {
    /// Whether reads under this mode may write.
    pub fn writes(&self) -> bool {
        matches!(self, Self::Persist)
    }
}

/// Reconciles the stored status of an order with its stored progress.
///
/// Only ever brings status in line with progress; progress itself is never
/// changed here.
pub fn reconcile(
    conn: &Connection,
    mode: StatusRepair,
    order_id: i64,
    stored_status: Option<&str>,
    progress: i64,
) -> Result<OrderStatus> {
    let derived = OrderStatus::from_progress(progress);
    let stored = stored_status.and_then(OrderStatus::parse);
    if stored == Some(derived) {
        return Ok(derived);
    }

    match mode {
        StatusRepair::Persist => {
            warn!(
                order_id,
                stored = stored_status.unwrap_or("<null>"),
                derived = %derived,
                progress,
                "Repairing stale order status"
            );
            order_repo::update_status(conn, order_id, derived.as_str())?;
            Ok(derived)
        }
        StatusRepair::Report => {
            warn!(
                order_id,
                stored = stored_status.unwrap_or("<null>"),
                derived = %derived,
                progress,
                "Stored order status is stale; reporting derived status"
            );
            Ok(derived)
        }
        StatusRepair::Off => Ok(stored.unwrap_or(derived)),
    }
}
