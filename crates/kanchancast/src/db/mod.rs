//! SQLite storage for orders, stages, products and employees.
//!
//! Repositories are free functions over a `&Connection` so that the
//! tracking layer can compose several of them in one [`Database::with_tx`]
//! unit of work, retried under a [`RetryPolicy`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::{Connection, Transaction, TransactionBehavior};

pub mod employee_repo;
pub mod error;
pub mod migrations;
pub mod order_repo;
pub mod product_repo;
pub mod retry;
pub mod stage_repo;

pub use error::{DatabaseError, SqliteFailure};
pub use retry::RetryPolicy;

/// Number of SQLite VM instructions between deadline checks.
const PROGRESS_OPS: std::os::raw::c_int = 1_000;

/// Connection-level tuning for a [`Database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseOptions {
    /// How long SQLite itself waits on a locked database before reporting busy.
    pub busy_timeout: Duration,
    /// Retry and deadline policy applied to every write transaction.
    pub retry: RetryPolicy,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(1_000),
            retry: RetryPolicy::DEFAULT,
        }
    }
}

/// Shared handle to the order store.
///
/// Clones share one connection behind a `Mutex`, so every unit of work
/// issued through a handle runs after the previous one has finished.
/// Other handles or processes on the same file are kept apart by
/// IMMEDIATE transactions in [`Database::with_tx`].
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    options: DatabaseOptions,
}

impl Database {
    /// [`Database::open_with`] using default options.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Self::open_with(path, DatabaseOptions::default())
    }

    /// Opens the store at `path`, creating parent directories and the file
    /// as needed, and migrates it to the latest schema.
    pub fn open_with(path: &Path, options: DatabaseOptions) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            options,
        })
    }

    /// Fresh migrated store that lives only as long as the handle.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            options: DatabaseOptions::default(),
        })
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    /// Runs `f` on the connection outside any explicit transaction.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }

    /// Runs `f` as one atomic unit of work.
    ///
    /// The transaction takes the write lock up front. If another connection
    /// holds it, everything is rolled back and `f` is re-run after the
    /// policy's backoff. Each attempt waits on the lock for at most the
    /// configured busy timeout, cut short to whatever is left of the
    /// deadline. Running out of attempts fails with [`DatabaseError::Busy`];
    /// reaching the deadline, while waiting or while statements execute,
    /// fails with [`DatabaseError::Timeout`]. Any other error rolls the
    /// transaction back and is returned as is.
    pub fn with_tx<F, T, E>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut(&Transaction<'_>) -> Result<T, E>,
        E: From<DatabaseError> + SqliteFailure,
    {
        let policy = self.options.retry;
        let started = Instant::now();
        let deadline = started + policy.deadline;

        let mut conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        conn.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));

        let mut attempts = 0;
        let result = loop {
            attempts += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let capped = remaining < self.options.busy_timeout;
            if let Err(e) = conn.busy_timeout(self.options.busy_timeout.min(remaining)) {
                break Err(DatabaseError::from(e).into());
            }

            match run_once(&mut *conn, &mut f) {
                Ok(value) => break Ok(value),
                Err(e) if retry::is_interrupted(e.sqlite_code()) => {
                    let elapsed = started.elapsed();
                    log::warn!("Transaction interrupted after {:?} (deadline)", elapsed);
                    break Err(DatabaseError::Timeout { elapsed }.into());
                }
                Err(e) if retry::is_contention(e.sqlite_code()) => {
                    let exhausted = attempts >= policy.max_attempts;
                    if capped || (!exhausted && !policy.should_retry(attempts, started)) {
                        let elapsed = started.elapsed();
                        log::warn!(
                            "Database still locked at the {:?} deadline ({} attempts)",
                            policy.deadline,
                            attempts
                        );
                        break Err(DatabaseError::Timeout { elapsed }.into());
                    }
                    if exhausted {
                        log::warn!("Database still locked after {} attempts", attempts);
                        break Err(DatabaseError::Busy { attempts }.into());
                    }
                    log::debug!(
                        "Database locked (attempt {}/{}), retrying in {:?}",
                        attempts,
                        policy.max_attempts,
                        policy.backoff
                    );
                    std::thread::sleep(policy.backoff);
                }
                Err(e) => break Err(e),
            }
        };

        conn.progress_handler(0, None::<fn() -> bool>);
        match conn.busy_timeout(self.options.busy_timeout) {
            Err(e) if result.is_ok() => Err(DatabaseError::from(e).into()),
            _ => result,
        }
    }
}

fn run_once<F, T, E>(conn: &mut Connection, f: &mut F) -> Result<T, E>
where
    F: FnMut(&Transaction<'_>) -> Result<T, E>,
    E: From<DatabaseError>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;
    let value = f(&tx)?;
    tx.commit().map_err(DatabaseError::from)?;
    Ok(value)
}

/// Returns the canonical database path: `~/.kanchancast/data/kanchancast.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".kanchancast").join("data").join("kanchancast.db"))
}
