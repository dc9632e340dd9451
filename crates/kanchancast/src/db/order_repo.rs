//! Reads and writes of the `orders` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

/// A raw order row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub order_id: i64,
    pub user_id: i64,
    pub product_id: i64,
    /// `YYYY-MM-DD`.
    pub date_ordered: String,
    /// Stored status text; may be stale or legacy in old databases.
    pub status: Option<String>,
    pub progress: i64,
}

impl OrderRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            order_id: row.get("order_id")?,
            user_id: row.get("user_id")?,
            product_id: row.get("product_id")?,
            date_ordered: row.get("date_ordered")?,
            status: row.get("status")?,
            progress: row.get("progress")?,
        })
    }
}

/// An order joined with its product's name and lead time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummaryRow {
    pub order: OrderRow,
    pub product_name: Option<String>,
    pub duration_amount: Option<i64>,
    pub duration_unit: Option<String>,
}

/// Values for a new order row.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: i64,
    pub product_id: i64,
    pub date_ordered: &'a str,
    pub status: &'a str,
    pub progress: i64,
}

/// Inserts a new order and returns its id.
pub fn insert(conn: &Connection, order: &NewOrder<'_>) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO orders (user_id, product_id, date_ordered, status, progress)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            order.user_id,
            order.product_id,
            order.date_ordered,
            order.status,
            order.progress,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Finds an order by its ID.
pub fn find_by_id(conn: &Connection, order_id: i64) -> Result<Option<OrderRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT order_id, user_id, product_id, date_ordered, status, progress
             FROM orders WHERE order_id = ?1",
            params![order_id],
            OrderRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Whether an order with this ID exists.
pub fn exists(conn: &Connection, order_id: i64) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM orders WHERE order_id = ?1",
            params![order_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Writes progress and status together.
pub fn update_progress(
    conn: &Connection,
    order_id: i64,
    progress: i64,
    status: &str,
) -> Result<usize, DatabaseError> {
    let n = conn.execute(
        "UPDATE orders SET progress = ?2, status = ?3 WHERE order_id = ?1",
        params![order_id, progress, status],
    )?;
    Ok(n)
}

/// Updates only the status of an order.
pub fn update_status(conn: &Connection, order_id: i64, status: &str) -> Result<usize, DatabaseError> {
    let n = conn.execute(
        "UPDATE orders SET status = ?2 WHERE order_id = ?1",
        params![order_id, status],
    )?;
    Ok(n)
}

/// Deletes an order; its stage rows go with it via the cascade.
pub fn delete(conn: &Connection, order_id: i64) -> Result<bool, DatabaseError> {
    let n = conn.execute("DELETE FROM orders WHERE order_id = ?1", params![order_id])?;
    Ok(n > 0)
}

const SUMMARY_SELECT: &str = "SELECT o.order_id, o.user_id, o.product_id, o.date_ordered,
        o.status, o.progress, p.name AS product_name,
        p.duration_amount, p.duration_unit
    FROM orders o
    LEFT JOIN products p ON o.product_id = p.product_id";

fn summary_from_row(row: &Row<'_>) -> Result<OrderSummaryRow, rusqlite::Error> {
    Ok(OrderSummaryRow {
        order: OrderRow::from_row(row)?,
        product_name: row.get("product_name")?,
        duration_amount: row.get("duration_amount")?,
        duration_unit: row.get("duration_unit")?,
    })
}

/// Lists order summaries, optionally for a single customer.
///
/// Incomplete orders come first, then newest first.
pub fn list_summaries(
    conn: &Connection,
    user_id: Option<i64>,
) -> Result<Vec<OrderSummaryRow>, DatabaseError> {
    let sql = format!(
        "{} WHERE (?1 IS NULL OR o.user_id = ?1)
         ORDER BY (CASE WHEN o.progress >= 100 THEN 1 ELSE 0 END) ASC, o.order_id DESC",
        SUMMARY_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id], summary_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Finds the summary of a single order.
pub fn find_summary(
    conn: &Connection,
    order_id: i64,
) -> Result<Option<OrderSummaryRow>, DatabaseError> {
    let sql = format!("{} WHERE o.order_id = ?1", SUMMARY_SELECT);
    let row = conn
        .query_row(&sql, params![order_id], summary_from_row)
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_order(user_id: i64) -> NewOrder<'static> {
        NewOrder {
            user_id,
            product_id: 1,
            date_ordered: "2024-01-10",
            status: "PENDING",
            progress: 0,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        db.with_conn(|conn| {
            let id = insert(conn, &sample_order(3))?;
            let found = find_by_id(conn, id)?.expect("order exists");
            assert_eq!(found.user_id, 3);
            assert_eq!(found.date_ordered, "2024-01-10");
            assert_eq!(found.status.as_deref(), Some("PENDING"));
            assert_eq!(found.progress, 0);
            assert!(exists(conn, id)?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        db.with_conn(|conn| {
            assert!(find_by_id(conn, 404)?.is_none());
            assert!(!exists(conn, 404)?);
            assert!(find_summary(conn, 404)?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_progress_and_status() {
        let db = test_db();
        db.with_conn(|conn| {
            let id = insert(conn, &sample_order(1))?;
            assert_eq!(update_progress(conn, id, 45, "PROCESSING")?, 1);
            let found = find_by_id(conn, id)?.unwrap();
            assert_eq!(found.progress, 45);
            assert_eq!(found.status.as_deref(), Some("PROCESSING"));

            update_status(conn, id, "COMPLETED")?;
            let found = find_by_id(conn, id)?.unwrap();
            assert_eq!(found.progress, 45);
            assert_eq!(found.status.as_deref(), Some("COMPLETED"));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_delete() {
        let db = test_db();
        db.with_conn(|conn| {
            let id = insert(conn, &sample_order(1))?;
            assert!(delete(conn, id)?);
            assert!(!delete(conn, id)?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_list_summaries_ordering_and_filter() {
        let db = test_db();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO products (product_id, name, duration_amount, duration_unit)
                 VALUES (1, 'Kundan Ring', 2, 'WEEKS')",
                [],
            )?;
            let a = insert(conn, &sample_order(1))?;
            let b = insert(conn, &sample_order(1))?;
            let c = insert(conn, &sample_order(2))?;
            update_progress(conn, b, 100, "COMPLETED")?;

            let all = list_summaries(conn, None)?;
            let ids: Vec<i64> = all.iter().map(|s| s.order.order_id).collect();
            assert_eq!(ids, vec![c, a, b]);
            assert_eq!(all[0].product_name.as_deref(), Some("Kundan Ring"));
            assert_eq!(all[0].duration_amount, Some(2));
            assert_eq!(all[0].duration_unit.as_deref(), Some("WEEKS"));

            let mine = list_summaries(conn, Some(1))?;
            let ids: Vec<i64> = mine.iter().map(|s| s.order.order_id).collect();
            assert_eq!(ids, vec![a, b]);
            Ok(())
        })
        .unwrap();
    }
}
