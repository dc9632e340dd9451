//! `OrderTracker`: the entry point for every stage-tracking operation.
//!
//! Each public method is one unit of work. Mutations run inside a single
//! retrying transaction, so provisioning, the mutation itself and the
//! progress recalculation commit or roll back together.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode};
use tracing::{info, info_span};

use super::assignment::{self, AssignmentPolicy};
use super::catalog::StageCatalog;
use super::completion;
use super::delivery::LeadTime;
use super::progress::{self, completion_by_stage, Progress};
use super::provisioner;
use super::read_model::{
    parse_order_date, AssignedTask, OrderFilter, OrderSummary, StageView, TrackingStage,
    UNASSIGNED,
};
use super::repair::{self, StatusRepair};
use super::status::OrderStatus;
use crate::config::Config;
use crate::db::order_repo::{NewOrder, OrderSummaryRow};
use crate::db::{employee_repo, order_repo, product_repo, stage_repo, Database, SqliteFailure};
use crate::error::{ConfigError, Result, TrackerError};

/// Behavioural switches for an [`OrderTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerOptions {
    pub status_repair: StatusRepair,
    pub assignment: AssignmentPolicy,
}

/// Tracks custom orders through the production stages.
#[derive(Clone)]
pub struct OrderTracker {
    db: Database,
    catalog: Arc<StageCatalog>,
    options: TrackerOptions,
}

impl OrderTracker {
    pub fn new(db: Database, catalog: Arc<StageCatalog>, options: TrackerOptions) -> Self {
        Self {
            db,
            catalog,
            options,
        }
    }

    /// Opens the configured database and builds a tracker over the
    /// standard stage catalog.
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.database_path().ok_or_else(|| ConfigError::Validation {
            message: "no database path configured and no home directory found".to_string(),
        })?;
        let db = Database::open_with(&path, config.database_options())?;
        Ok(Self::new(
            db,
            Arc::new(StageCatalog::standard()),
            config.tracker_options(),
        ))
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    fn write<T>(&self, mut f: impl FnMut(&Connection, &StageCatalog) -> Result<T>) -> Result<T> {
        let catalog = Arc::clone(&self.catalog);
        self.db.with_tx(|tx| f(tx, &catalog))
    }

    /// Creates an order in the pending state with all stages provisioned.
    pub fn place_order(&self, user_id: i64, product_id: i64, date_ordered: NaiveDate) -> Result<i64> {
        let _span = info_span!("tracker.place_order", user_id, product_id).entered();
        let date = date_ordered.format("%Y-%m-%d").to_string();
        let order_id = self.write(|conn, catalog| {
            let order_id = order_repo::insert(
                conn,
                &NewOrder {
                    user_id,
                    product_id,
                    date_ordered: &date,
                    status: OrderStatus::Pending.as_str(),
                    progress: 0,
                },
            )?;
            progress::recalculate(conn, catalog, order_id)?;
            Ok(order_id)
        })?;
        info!(order_id, "Order placed");
        Ok(order_id)
    }

    /// Ensures the order has one row per catalog stage. Returns the number
    /// of rows added.
    pub fn ensure_stages(&self, order_id: i64) -> Result<usize> {
        let _span = info_span!("tracker.ensure_stages", order_id).entered();
        self.write(|conn, catalog| provisioner::ensure_stages(conn, catalog, order_id))
    }

    /// Assigns an employee to a stage, replacing any previous assignee.
    pub fn assign(&self, order_id: i64, stage_name: &str, employee_id: i64) -> Result<bool> {
        let _span = info_span!("tracker.assign", order_id, stage = stage_name, employee_id).entered();
        let policy = self.options.assignment;
        self.write(|conn, catalog| {
            assignment::assign(conn, catalog, policy, order_id, stage_name, employee_id)
        })
    }

    /// Marks a stage complete or incomplete and recalculates the order.
    pub fn set_completion(&self, order_id: i64, stage_name: &str, completed: bool) -> Result<bool> {
        let _span =
            info_span!("tracker.set_completion", order_id, stage = stage_name, completed).entered();
        let outcome = self.write(|conn, catalog| {
            completion::set_completion(conn, catalog, order_id, stage_name, completed)
        })?;
        if let Some(progress) = outcome {
            info!(
                order_id,
                percent = progress.percent,
                status = %progress.status,
                "Stage completion recorded"
            );
        }
        Ok(outcome.is_some())
    }

    pub fn mark_stage_completed(&self, order_id: i64, stage_name: &str) -> Result<bool> {
        self.set_completion(order_id, stage_name, true)
    }

    pub fn mark_stage_incomplete(&self, order_id: i64, stage_name: &str) -> Result<bool> {
        self.set_completion(order_id, stage_name, false)
    }

    /// Recomputes and stores the order's progress and status.
    pub fn recalculate(&self, order_id: i64) -> Result<Progress> {
        let _span = info_span!("tracker.recalculate", order_id).entered();
        self.write(|conn, catalog| progress::recalculate(conn, catalog, order_id))
    }

    /// Stages of an order in catalog order, with assignees.
    ///
    /// Legacy duplicate rows are folded into their catalog stage: it is
    /// complete if any duplicate is, and shows the first assignee found.
    pub fn list_stages(&self, order_id: i64) -> Result<Vec<StageView>> {
        self.write(|conn, catalog| {
            provisioner::ensure_stages(conn, catalog, order_id)?;
            let rows = stage_repo::list_with_employees(conn, order_id)?;
            let done = completion_by_stage(catalog, rows.iter().map(|r| &r.stage));

            let mut assignees: Vec<Option<(i64, Option<String>)>> = vec![None; catalog.len()];
            for row in &rows {
                let (Some(idx), Some(employee_id)) =
                    (catalog.position(&row.stage.stage_name), row.stage.employee_id)
                else {
                    continue;
                };
                if assignees[idx].is_none() {
                    assignees[idx] = Some((employee_id, row.employee_name.clone()));
                }
            }

            Ok(catalog
                .labels()
                .zip(done)
                .zip(assignees)
                .map(|((label, completed), assignee)| {
                    let (employee_id, employee_name) = match assignee {
                        Some((id, name)) => (Some(id), name.unwrap_or_else(|| UNASSIGNED.to_string())),
                        None => (None, UNASSIGNED.to_string()),
                    };
                    StageView {
                        stage: label.to_string(),
                        employee_id,
                        employee_name,
                        completed,
                    }
                })
                .collect())
        })
    }

    /// Customer-facing stage list: no employee identities. Recalculates the
    /// order first so the list and the stored progress agree.
    pub fn list_stages_for_tracking(&self, order_id: i64) -> Result<Vec<TrackingStage>> {
        self.write(|conn, catalog| {
            progress::recalculate(conn, catalog, order_id)?;
            let rows = stage_repo::list_for_order(conn, order_id)?;
            let done = completion_by_stage(catalog, &rows);
            Ok(catalog
                .labels()
                .zip(done)
                .map(|(label, completed)| TrackingStage {
                    stage: label.to_string(),
                    completed,
                })
                .collect())
        })
    }

    /// Current assignee per catalog stage, for stages that have one.
    pub fn assigned_employees(&self, order_id: i64) -> Result<HashMap<String, i64>> {
        self.write(|conn, catalog| {
            provisioner::ensure_stages(conn, catalog, order_id)?;
            let mut map = HashMap::new();
            for row in stage_repo::list_for_order(conn, order_id)? {
                if let (Some(label), Some(employee_id)) =
                    (catalog.resolve(&row.stage_name), row.employee_id)
                {
                    map.entry(label.to_string()).or_insert(employee_id);
                }
            }
            Ok(map)
        })
    }

    fn summarize(&self, conn: &Connection, row: OrderSummaryRow) -> Result<OrderSummary> {
        let order = row.order;
        let status = repair::reconcile(
            conn,
            self.options.status_repair,
            order.order_id,
            order.status.as_deref(),
            order.progress,
        )?;
        let lead = LeadTime::from_columns(row.duration_amount, row.duration_unit.as_deref());
        Ok(OrderSummary {
            order_id: order.order_id,
            user_id: order.user_id,
            product_id: order.product_id,
            product_name: row.product_name,
            delivery_date: parse_order_date(&order.date_ordered).map(|d| lead.delivery_date(d)),
            date_ordered: order.date_ordered,
            status,
            progress_percent: order.progress,
        })
    }

    fn read<T>(&self, mut f: impl FnMut(&Connection) -> Result<T>) -> Result<T> {
        if self.options.status_repair.writes() {
            self.db.with_tx(|tx| f(tx))
        } else {
            self.db.with_conn(|conn| Ok(f(conn)))?
        }
    }

    /// Order summaries, incomplete orders first, then newest first.
    ///
    /// Stale statuses are handled according to the configured
    /// [`StatusRepair`] mode.
    pub fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderSummary>> {
        self.read(|conn| {
            order_repo::list_summaries(conn, filter.user_id)?
                .into_iter()
                .map(|row| self.summarize(conn, row))
                .collect()
        })
    }

    pub fn get_order(&self, order_id: i64) -> Result<OrderSummary> {
        self.read(|conn| {
            let row = order_repo::find_summary(conn, order_id)?
                .ok_or(TrackerError::OrderNotFound(order_id))?;
            self.summarize(conn, row)
        })
    }

    /// Projected delivery date of an order from its product's lead time.
    pub fn delivery_date_for_order(&self, order_id: i64) -> Result<Option<NaiveDate>> {
        let (order, lead) = self.db.with_conn(|conn| {
            let Some(order) = order_repo::find_by_id(conn, order_id)? else {
                return Ok(None);
            };
            let lead = product_repo::find_lead_time(conn, order.product_id)?;
            Ok(Some((order, lead)))
        })?
        .ok_or(TrackerError::OrderNotFound(order_id))?;

        // An order whose product is gone has no lead time.
        let lead = lead
            .map(|row| LeadTime::from_columns(row.duration_amount, row.duration_unit.as_deref()))
            .unwrap_or_else(|| LeadTime::from_columns(None, None));
        Ok(parse_order_date(&order.date_ordered).map(|d| lead.delivery_date(d)))
    }

    /// Every stage assigned to an employee, newest order first.
    pub fn list_tasks_for_employee(&self, employee_id: i64) -> Result<Vec<AssignedTask>> {
        let rows = self
            .db
            .with_conn(|conn| stage_repo::list_for_employee(conn, employee_id))?;
        Ok(rows
            .into_iter()
            .map(|row| AssignedTask {
                order_id: row.order_id,
                stage: self.catalog.canonicalize(&row.stage_name),
                product_name: row.product_name,
                completed: row.completed,
            })
            .collect())
    }

    /// Deletes an order together with its stage rows.
    pub fn delete_order(&self, order_id: i64) -> Result<bool> {
        let _span = info_span!("tracker.delete_order", order_id).entered();
        let deleted = self.write(|conn, _| Ok(order_repo::delete(conn, order_id)?))?;
        if deleted {
            info!(order_id, "Order deleted");
        }
        Ok(deleted)
    }

    /// Deletes an employee who holds no open assignments.
    ///
    /// Assignments on completed stages still pin the employee row; the
    /// store's restriction surfaces as the same conflict.
    pub fn delete_employee(&self, employee_id: i64) -> Result<()> {
        let _span = info_span!("tracker.delete_employee", employee_id).entered();
        self.write(|conn, _| {
            if employee_repo::find_by_id(conn, employee_id)?.is_none() {
                return Err(TrackerError::EmployeeNotFound(employee_id));
            }
            let open = stage_repo::count_open_assignments(conn, employee_id)?;
            if open > 0 {
                return Err(TrackerError::ReferentialConflict {
                    employee_id,
                    active_assignments: open,
                });
            }
            match employee_repo::delete(conn, employee_id) {
                Ok(_) => Ok(()),
                Err(e) if e.sqlite_code() == Some(ErrorCode::ConstraintViolation) => {
                    Err(TrackerError::ReferentialConflict {
                        employee_id,
                        active_assignments: 0,
                    })
                }
                Err(e) => Err(e.into()),
            }
        })?;
        info!(employee_id, "Employee deleted");
        Ok(())
    }
}
