//! Schema migrations.
//!
//! Applied versions are recorded in `_migrations`. Each migration runs in
//! its own IMMEDIATE transaction together with its bookkeeping row, so two
//! processes opening the same file at once cannot both apply it. Column
//! additions are skipped when a database written by an older build
//! already carries the column.

use rusqlite::{params, Connection, Transaction, TransactionBehavior};

use super::error::DatabaseError;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
    kind: MigrationKind,
}

enum MigrationKind {
    Schema,
    /// `ALTER TABLE .. ADD COLUMN`; not re-run if the column exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "products_and_employees",
        sql: include_str!("sql/001_create_collaborators.sql"),
        kind: MigrationKind::Schema,
    },
    Migration {
        version: 2,
        name: "orders",
        sql: include_str!("sql/002_create_orders.sql"),
        kind: MigrationKind::Schema,
    },
    Migration {
        version: 3,
        name: "order_stages",
        sql: include_str!("sql/003_create_order_stages.sql"),
        kind: MigrationKind::Schema,
    },
    Migration {
        version: 4,
        name: "products_duration_amount",
        sql: include_str!("sql/004_add_duration_amount.sql"),
        kind: MigrationKind::AddColumn {
            table: "products",
            column: "duration_amount",
        },
    },
    Migration {
        version: 5,
        name: "products_duration_unit",
        sql: include_str!("sql/005_add_duration_unit.sql"),
        kind: MigrationKind::AddColumn {
            table: "products",
            column: "duration_unit",
        },
    },
    Migration {
        version: 6,
        name: "order_stages_unique_name",
        sql: include_str!("sql/006_unique_order_stage.sql"),
        kind: MigrationKind::Schema,
    },
];

/// Brings the schema up to the latest version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let mut applied = 0;
    for migration in MIGRATIONS {
        if apply(conn, migration)? {
            applied += 1;
        }
    }
    if applied > 0 {
        log::info!(
            "Schema at v{} ({} migration(s) applied)",
            latest_version(conn)?,
            applied
        );
    }
    Ok(())
}

fn latest_version(conn: &Connection) -> Result<u32, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?)
}

/// Applies one migration unless it is already recorded. Returns whether it
/// was recorded by this call.
fn apply(conn: &Connection, migration: &Migration) -> Result<bool, DatabaseError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    if latest_version(&tx)? >= migration.version {
        return Ok(false);
    }

    let needed = match migration.kind {
        MigrationKind::Schema => true,
        MigrationKind::AddColumn { table, column } => !column_exists(&tx, table, column)?,
    };
    if needed {
        log::debug!("Applying migration v{}: {}", migration.version, migration.name);
        tx.execute_batch(migration.sql)
            .map_err(|e| DatabaseError::Migration {
                version: migration.version,
                reason: e.to_string(),
            })?;
    } else {
        log::debug!(
            "Migration v{} already reflected in schema; recording only",
            migration.version
        );
    }

    tx.execute(
        "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
        params![migration.version, migration.name],
    )?;
    tx.commit()?;
    Ok(true)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        params![table, column],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}
