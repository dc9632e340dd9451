//! Product lead-time lookups against the catalog's `products` table.
//!
//! The product catalog is owned elsewhere; this module only reads the
//! lead-time columns, plus a minimal insert used to seed fixtures.

use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseError;

/// Raw lead-time columns of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadTimeRow {
    pub duration_amount: Option<i64>,
    pub duration_unit: Option<String>,
}

/// Returns the lead time of a product, or `None` if the product is unknown.
pub fn find_lead_time(
    conn: &Connection,
    product_id: i64,
) -> Result<Option<LeadTimeRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT duration_amount, duration_unit FROM products WHERE product_id = ?1",
            params![product_id],
            |r| {
                Ok(LeadTimeRow {
                    duration_amount: r.get(0)?,
                    duration_unit: r.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Inserts a product with its lead time and returns its id.
pub fn insert(
    conn: &Connection,
    name: &str,
    duration_amount: i64,
    duration_unit: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO products (name, duration_amount, duration_unit) VALUES (?1, ?2, ?3)",
        params![name, duration_amount, duration_unit],
    )?;
    Ok(conn.last_insert_rowid())
}
