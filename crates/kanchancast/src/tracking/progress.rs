//! Progress aggregation: completion percentage and status per order.

use serde::Serialize;
use tracing::debug;

use super::catalog::StageCatalog;
use super::provisioner::ensure_stages;
use super::status::{progress_percent, OrderStatus};
use crate::db::stage_repo::StageRow;
use crate::db::{order_repo, stage_repo};
use crate::error::Result;
use rusqlite::Connection;

/// Outcome of an aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub percent: i64,
    pub status: OrderStatus,
}

/// Completion per catalog stage, indexed by catalog position.
///
/// Rows are canonicalized first. When several rows map to the same stage
/// the stage counts as done if any of them is done. Rows that do not map
/// to a catalog stage are ignored.
pub fn completion_by_stage<'a, I>(catalog: &StageCatalog, rows: I) -> Vec<bool>
where
    I: IntoIterator<Item = &'a StageRow>,
{
    let mut done = vec![false; catalog.len()];
    for row in rows {
        if let Some(idx) = catalog.position(&row.stage_name) {
            done[idx] |= row.completed;
        }
    }
    done
}

/// Aggregates progress from a set of stage rows without touching the store.
pub fn compute<'a, I>(catalog: &StageCatalog, rows: I) -> Progress
where
    I: IntoIterator<Item = &'a StageRow>,
{
    let done = completion_by_stage(catalog, rows)
        .into_iter()
        .filter(|d| *d)
        .count();
    let total = catalog.len();
    let percent = progress_percent(done, total);
    Progress {
        done,
        total,
        percent,
        status: OrderStatus::from_progress(percent),
    }
}

/// Recomputes an order's progress and status and writes both to the order.
///
/// Provisions missing stages first so the percentage is always taken over
/// the full catalog. Run inside the caller's transaction.
pub fn recalculate(conn: &Connection, catalog: &StageCatalog, order_id: i64) -> Result<Progress> {
    ensure_stages(conn, catalog, order_id)?;

    let rows = stage_repo::list_for_order(conn, order_id)?;
    let progress = compute(catalog, &rows);

    order_repo::update_progress(conn, order_id, progress.percent, progress.status.as_str())?;
    debug!(
        order_id,
        done = progress.done,
        percent = progress.percent,
        status = %progress.status,
        "Recalculated order progress"
    );
    Ok(progress)
}
