//! Stage provisioning: every order gets one row per catalog stage.

use std::collections::HashSet;

use tracing::debug;

use super::catalog::StageCatalog;
use crate::db::{order_repo, stage_repo};
use crate::error::{Result, TrackerError};
use rusqlite::Connection;

/// Inserts the catalog stages an order is missing and returns how many
/// rows were added.
///
/// Existing rows are matched after canonicalization, so legacy spellings
/// count as present. Idempotent: once all stages exist this is a no-op.
/// Call inside the caller's transaction; the insert batch is then
/// all-or-nothing.
pub fn ensure_stages(conn: &Connection, catalog: &StageCatalog, order_id: i64) -> Result<usize> {
    if !order_repo::exists(conn, order_id)? {
        return Err(TrackerError::OrderNotFound(order_id));
    }

    let present: HashSet<String> = stage_repo::list_for_order(conn, order_id)?
        .iter()
        .map(|row| catalog.canonicalize(&row.stage_name))
        .collect();

    let missing: Vec<&str> = catalog
        .labels()
        .filter(|label| !present.contains(*label))
        .collect();
    if missing.is_empty() {
        return Ok(0);
    }

    let inserted = stage_repo::insert_batch(conn, order_id, &missing)?;
    debug!(order_id, inserted, "Provisioned missing stages");
    Ok(inserted)
}
