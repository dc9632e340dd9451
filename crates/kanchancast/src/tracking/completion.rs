//! Recording stage completion.

use rusqlite::Connection;
use tracing::debug;

use super::assignment::{matching_stage_ids, resolve_stage};
use super::catalog::StageCatalog;
use super::progress::{recalculate, Progress};
use super::provisioner::ensure_stages;
use crate::db::stage_repo;
use crate::error::Result;

/// Sets the completion flag of a stage and re-aggregates the order.
///
/// Every row that canonicalizes to the stage is updated. Returns the new
/// progress, or `None` if no row matched. Setting the same value twice
/// leaves the same state behind.
pub fn set_completion(
    conn: &Connection,
    catalog: &StageCatalog,
    order_id: i64,
    stage_name: &str,
    completed: bool,
) -> Result<Option<Progress>> {
    ensure_stages(conn, catalog, order_id)?;
    let stage = resolve_stage(catalog, stage_name)?;

    let rows = stage_repo::list_for_order(conn, order_id)?;
    let ids = matching_stage_ids(catalog, &rows, stage);
    let updated = stage_repo::set_completed(conn, &ids, completed)?;
    debug!(order_id, stage, completed, updated, "Updated stage completion");

    if updated == 0 {
        return Ok(None);
    }
    Ok(Some(recalculate(conn, catalog, order_id)?))
}
