//! Shared fixtures for kanchancast integration tests.
//!
//! `TestHarness` owns a temporary directory with an on-disk database seeded
//! with a few products and employees, and hands out trackers over it.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use kanchancast::db::{employee_repo, product_repo, Database, DatabaseOptions, RetryPolicy};
use kanchancast::tracking::{OrderTracker, StageCatalog, TrackerOptions};

/// Ids of the seeded rows.
#[derive(Debug, Clone, Copy)]
pub struct Seed {
    /// Ring, 2 weeks lead time.
    pub ring: i64,
    /// Pendant, 1 month lead time.
    pub pendant: i64,
    /// Bangle, no lead time.
    pub bangle: i64,
    /// Works in "Final Polishing".
    pub polisher: i64,
    /// Works in "Stone Setting (if applicable)".
    pub setter: i64,
    /// No declared work area.
    pub trainee: i64,
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub db_path: PathBuf,
    pub seed: Seed,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("data").join("kanchancast.db");
        let db = Database::open(&db_path).expect("Failed to open database");

        let seed = db
            .with_conn(|conn| {
                Ok(Seed {
                    ring: product_repo::insert(conn, "Solitaire Ring", 2, "WEEKS")?,
                    pendant: product_repo::insert(conn, "Heart Pendant", 1, "MONTHS")?,
                    bangle: product_repo::insert(conn, "Plain Bangle", 0, "DAYS")?,
                    polisher: employee_repo::insert(conn, "Asha", Some("Final Polishing"))?,
                    setter: employee_repo::insert(
                        conn,
                        "Ravi",
                        Some("Stone Setting (if applicable)"),
                    )?,
                    trainee: employee_repo::insert(conn, "Meera", None)?,
                })
            })
            .expect("Failed to seed database");

        Self {
            temp_dir,
            db_path,
            seed,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A fresh connection to the harness database.
    pub fn database(&self) -> Database {
        Database::open_with(
            &self.db_path,
            DatabaseOptions {
                retry: RetryPolicy::new(
                    20,
                    std::time::Duration::from_millis(50),
                    std::time::Duration::from_secs(30),
                ),
                ..DatabaseOptions::default()
            },
        )
        .expect("Failed to open database")
    }

    pub fn tracker(&self) -> OrderTracker {
        self.tracker_with(TrackerOptions::default())
    }

    pub fn tracker_with(&self, options: TrackerOptions) -> OrderTracker {
        OrderTracker::new(self.database(), Arc::new(StageCatalog::standard()), options)
    }
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}
