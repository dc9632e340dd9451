//! Row-level access to the `order_stages` table.
//!
//! Functions take a plain `&Connection` so callers can compose several of
//! them inside one transaction (`Transaction` derefs to `Connection`).

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row};

use super::DatabaseError;

/// Completion flag as persisted in `order_stages.completed`.
///
/// Stored as the legacy `'Yes'` / `'No'` text. On read, integer 0/1 and
/// `true` / `false` text are accepted too; NULL reads as not completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionFlag(pub bool);

impl ToSql for CompletionFlag {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(if self.0 { "Yes" } else { "No" }))
    }
}

impl FromSql for CompletionFlag {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self(false)),
            ValueRef::Integer(i) => Ok(Self(i != 0)),
            ValueRef::Text(bytes) => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| FromSqlError::Other(Box::new(e)))?
                    .trim();
                Ok(Self(
                    text.eq_ignore_ascii_case("yes")
                        || text.eq_ignore_ascii_case("true")
                        || text == "1",
                ))
            }
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A raw stage row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRow {
    pub stage_id: i64,
    pub order_id: i64,
    /// Name as stored; may be a legacy variant of a catalog stage.
    pub stage_name: String,
    pub employee_id: Option<i64>,
    pub assigned_at: Option<String>,
    pub completed: bool,
}

impl StageRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            stage_id: row.get("stage_id")?,
            order_id: row.get("order_id")?,
            stage_name: row.get("stage_name")?,
            employee_id: row.get("employee_id")?,
            assigned_at: row.get("assigned_at")?,
            completed: row.get::<_, CompletionFlag>("completed")?.0,
        })
    }
}

/// A stage row joined with the assignee's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageWithEmployee {
    pub stage: StageRow,
    pub employee_name: Option<String>,
}

/// A stage assigned to an employee, joined with its order and product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedStageRow {
    pub order_id: i64,
    pub stage_name: String,
    pub product_name: Option<String>,
    pub completed: bool,
}

/// Lists every stage row of an order in insertion order.
pub fn list_for_order(conn: &Connection, order_id: i64) -> Result<Vec<StageRow>, DatabaseError> {
    let mut stmt = conn.prepare_cached(
        "SELECT stage_id, order_id, stage_name, employee_id, assigned_at, completed
         FROM order_stages WHERE order_id = ?1 ORDER BY stage_id",
    )?;
    let rows = stmt
        .query_map(params![order_id], StageRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists every stage row of an order together with the assignee's name.
pub fn list_with_employees(
    conn: &Connection,
    order_id: i64,
) -> Result<Vec<StageWithEmployee>, DatabaseError> {
    let mut stmt = conn.prepare_cached(
        "SELECT s.stage_id, s.order_id, s.stage_name, s.employee_id, s.assigned_at,
                s.completed, e.name AS employee_name
         FROM order_stages s
         LEFT JOIN employees e ON s.employee_id = e.employee_id
         WHERE s.order_id = ?1
         ORDER BY s.stage_id",
    )?;
    let rows = stmt
        .query_map(params![order_id], |row| {
            Ok(StageWithEmployee {
                stage: StageRow::from_row(row)?,
                employee_name: row.get("employee_name")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Inserts one unassigned, incomplete row per name.
///
/// Rows are written with a single cached statement; run inside a
/// transaction to make the batch all-or-nothing.
pub fn insert_batch(
    conn: &Connection,
    order_id: i64,
    stage_names: &[&str],
) -> Result<usize, DatabaseError> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO order_stages (order_id, stage_name, employee_id, completed)
         VALUES (?1, ?2, NULL, ?3)",
    )?;
    let mut inserted = 0;
    for name in stage_names {
        inserted += stmt.execute(params![order_id, name, CompletionFlag(false)])?;
    }
    Ok(inserted)
}

/// Sets the assignee on the given rows and stamps `assigned_at`.
pub fn set_employee(
    conn: &Connection,
    stage_ids: &[i64],
    employee_id: i64,
) -> Result<usize, DatabaseError> {
    let mut stmt = conn.prepare_cached(
        "UPDATE order_stages SET employee_id = ?2, assigned_at = datetime('now')
         WHERE stage_id = ?1",
    )?;
    let mut updated = 0;
    for id in stage_ids {
        updated += stmt.execute(params![id, employee_id])?;
    }
    Ok(updated)
}

/// Sets the completion flag on the given rows.
pub fn set_completed(
    conn: &Connection,
    stage_ids: &[i64],
    completed: bool,
) -> Result<usize, DatabaseError> {
    let mut stmt =
        conn.prepare_cached("UPDATE order_stages SET completed = ?2 WHERE stage_id = ?1")?;
    let mut updated = 0;
    for id in stage_ids {
        updated += stmt.execute(params![id, CompletionFlag(completed)])?;
    }
    Ok(updated)
}

/// Counts the employee's assignments on stages that are not yet complete.
///
/// The completion test mirrors what [`CompletionFlag`] reads as done.
pub fn count_open_assignments(conn: &Connection, employee_id: i64) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM order_stages
         WHERE employee_id = ?1
           AND NOT (
                (typeof(completed) = 'text' AND lower(trim(completed)) IN ('yes', 'true', '1'))
             OR (typeof(completed) = 'integer' AND completed <> 0)
           )",
        params![employee_id],
        |r| r.get(0),
    )?;
    Ok(count.max(0) as u64)
}

/// Lists all stages assigned to an employee, newest order first.
pub fn list_for_employee(
    conn: &Connection,
    employee_id: i64,
) -> Result<Vec<AssignedStageRow>, DatabaseError> {
    let mut stmt = conn.prepare_cached(
        "SELECT o.order_id, s.stage_name, p.name AS product_name, s.completed
         FROM order_stages s
         JOIN orders o ON s.order_id = o.order_id
         LEFT JOIN products p ON o.product_id = p.product_id
         WHERE s.employee_id = ?1
         ORDER BY o.order_id DESC, s.stage_id",
    )?;
    let rows = stmt
        .query_map(params![employee_id], |row| {
            Ok(AssignedStageRow {
                order_id: row.get("order_id")?,
                stage_name: row.get("stage_name")?,
                product_name: row.get("product_name")?,
                completed: row.get::<_, CompletionFlag>("completed")?.0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
