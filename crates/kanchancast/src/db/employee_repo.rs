//! Employee directory lookups against the `employees` table.

use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseError;

/// A raw employee row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRow {
    pub employee_id: i64,
    pub name: String,
    /// Declared work area, as free text.
    pub work_area: Option<String>,
}

/// Inserts an employee and returns its id.
pub fn insert(conn: &Connection, name: &str, work_area: Option<&str>) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO employees (name, work_area) VALUES (?1, ?2)",
        params![name, work_area],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Finds an employee by id.
pub fn find_by_id(conn: &Connection, employee_id: i64) -> Result<Option<EmployeeRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT employee_id, name, work_area FROM employees WHERE employee_id = ?1",
            params![employee_id],
            |r| {
                Ok(EmployeeRow {
                    employee_id: r.get(0)?,
                    name: r.get(1)?,
                    work_area: r.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Deletes an employee row. Fails with a foreign-key constraint error while
/// any stage still references the employee.
pub fn delete(conn: &Connection, employee_id: i64) -> Result<bool, DatabaseError> {
    let n = conn.execute(
        "DELETE FROM employees WHERE employee_id = ?1",
        params![employee_id],
    )?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_insert_find_delete() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let id = insert(conn, "Ravi", Some("Stone Setting (if applicable)"))?;
            let row = find_by_id(conn, id)?.unwrap();
            assert_eq!(row.name, "Ravi");
            assert_eq!(row.work_area.as_deref(), Some("Stone Setting (if applicable)"));

            assert!(delete(conn, id)?);
            assert!(find_by_id(conn, id)?.is_none());
            assert!(!delete(conn, id)?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_delete_restricted_while_referenced() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let id = insert(conn, "Meera", None)?;
            conn.execute(
                "INSERT INTO orders (user_id, product_id, date_ordered) VALUES (1, 1, '2024-01-10')",
                [],
            )?;
            conn.execute(
                "INSERT INTO order_stages (order_id, stage_name, employee_id, completed)
                 VALUES (?1, 'Plating', ?2, 'Yes')",
                params![conn.last_insert_rowid(), id],
            )?;
            assert!(delete(conn, id).is_err());
            Ok(())
        })
        .unwrap();
    }
}
