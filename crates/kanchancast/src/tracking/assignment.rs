//! Assigning workers to order stages.

use rusqlite::Connection;
use tracing::debug;

use super::catalog::StageCatalog;
use super::provisioner::ensure_stages;
use crate::db::employee_repo::{self, EmployeeRow};
use crate::db::stage_repo::{self, StageRow};
use crate::error::{Result, TrackerError};

/// Checks applied before an employee is bound to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentPolicy {
    /// Only employees whose declared work area is the stage may take it.
    pub enforce_work_area: bool,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            enforce_work_area: true,
        }
    }
}

/// Resolves a caller-supplied stage name to its catalog label.
pub(crate) fn resolve_stage<'c>(catalog: &'c StageCatalog, stage_name: &str) -> Result<&'c str> {
    catalog
        .resolve(stage_name)
        .ok_or_else(|| TrackerError::UnknownStage {
            stage: stage_name.trim().to_string(),
        })
}

/// Ids of every row that canonicalizes to `stage`, legacy spellings included.
pub(crate) fn matching_stage_ids(catalog: &StageCatalog, rows: &[StageRow], stage: &str) -> Vec<i64> {
    rows.iter()
        .filter(|row| catalog.resolve(&row.stage_name) == Some(stage))
        .map(|row| row.stage_id)
        .collect()
}

/// Fails unless the employee's declared work area is `stage`.
pub fn check_work_area(catalog: &StageCatalog, employee: &EmployeeRow, stage: &str) -> Result<()> {
    let area = employee.work_area.as_deref().unwrap_or("");
    if catalog.resolve(area) == Some(stage) {
        return Ok(());
    }
    Err(TrackerError::WorkAreaMismatch {
        employee_id: employee.employee_id,
        work_area: area.trim().to_string(),
        stage: stage.to_string(),
    })
}

/// Binds `employee_id` to a stage of an order, replacing any previous
/// assignee. Does not change completion or progress.
///
/// Returns whether any row was updated.
pub fn assign(
    conn: &Connection,
    catalog: &StageCatalog,
    policy: AssignmentPolicy,
    order_id: i64,
    stage_name: &str,
    employee_id: i64,
) -> Result<bool> {
    ensure_stages(conn, catalog, order_id)?;
    let stage = resolve_stage(catalog, stage_name)?;

    let employee = employee_repo::find_by_id(conn, employee_id)?
        .ok_or(TrackerError::EmployeeNotFound(employee_id))?;
    if policy.enforce_work_area {
        check_work_area(catalog, &employee, stage)?;
    }

    let rows = stage_repo::list_for_order(conn, order_id)?;
    let ids = matching_stage_ids(catalog, &rows, stage);
    let updated = stage_repo::set_employee(conn, &ids, employee_id)?;

    debug!(order_id, stage, employee_id, updated, "Assigned employee to stage");
    Ok(updated > 0)
}
