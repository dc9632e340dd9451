//! Async access to an [`OrderTracker`] for callers on a tokio runtime.
//!
//! Store access is blocking, so every call is moved onto the blocking pool.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use super::progress::Progress;
use super::read_model::{AssignedTask, OrderFilter, OrderSummary, StageView, TrackingStage};
use super::tracker::OrderTracker;
use crate::error::{Result, TrackerError};

/// Cheaply cloneable async handle over a shared tracker.
#[derive(Clone)]
pub struct TrackerHandle {
    inner: Arc<OrderTracker>,
}

impl TrackerHandle {
    pub fn new(tracker: OrderTracker) -> Self {
        Self {
            inner: Arc::new(tracker),
        }
    }

    pub fn tracker(&self) -> &OrderTracker {
        &self.inner
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&OrderTracker) -> Result<T> + Send + 'static,
    {
        let tracker = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&tracker))
            .await
            .map_err(|e| TrackerError::TaskFailed(e.to_string()))?
    }

    pub async fn place_order(
        &self,
        user_id: i64,
        product_id: i64,
        date_ordered: NaiveDate,
    ) -> Result<i64> {
        self.run(move |t| t.place_order(user_id, product_id, date_ordered))
            .await
    }

    pub async fn ensure_stages(&self, order_id: i64) -> Result<usize> {
        self.run(move |t| t.ensure_stages(order_id)).await
    }

    pub async fn assign(&self, order_id: i64, stage: String, employee_id: i64) -> Result<bool> {
        self.run(move |t| t.assign(order_id, &stage, employee_id))
            .await
    }

    pub async fn set_completion(&self, order_id: i64, stage: String, completed: bool) -> Result<bool> {
        self.run(move |t| t.set_completion(order_id, &stage, completed))
            .await
    }

    pub async fn recalculate(&self, order_id: i64) -> Result<Progress> {
        self.run(move |t| t.recalculate(order_id)).await
    }

    pub async fn list_stages(&self, order_id: i64) -> Result<Vec<StageView>> {
        self.run(move |t| t.list_stages(order_id)).await
    }

    pub async fn list_stages_for_tracking(&self, order_id: i64) -> Result<Vec<TrackingStage>> {
        self.run(move |t| t.list_stages_for_tracking(order_id))
            .await
    }

    pub async fn assigned_employees(&self, order_id: i64) -> Result<HashMap<String, i64>> {
        self.run(move |t| t.assigned_employees(order_id)).await
    }

    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderSummary>> {
        self.run(move |t| t.list_orders(&filter)).await
    }

    pub async fn get_order(&self, order_id: i64) -> Result<OrderSummary> {
        self.run(move |t| t.get_order(order_id)).await
    }

    pub async fn list_tasks_for_employee(&self, employee_id: i64) -> Result<Vec<AssignedTask>> {
        self.run(move |t| t.list_tasks_for_employee(employee_id))
            .await
    }

    pub async fn delete_order(&self, order_id: i64) -> Result<bool> {
        self.run(move |t| t.delete_order(order_id)).await
    }

    pub async fn delete_employee(&self, employee_id: i64) -> Result<()> {
        self.run(move |t| t.delete_employee(employee_id)).await
    }
}

impl From<OrderTracker> for TrackerHandle {
    fn from(tracker: OrderTracker) -> Self {
        Self::new(tracker)
    }
}
