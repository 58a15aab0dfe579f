use crate::api::response::{paginate, Pagination};
use crate::error::{AppError, AppResult};
use crate::settlement::TOTAL_COST_RATE;
use crate::store::Store;
use crate::tasks::models::{
    AttemptRecord, CreateTaskRequest, Report, Task, TaskStatus,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Task registry - CRUD, the status state machine and escrow accounting.
///
/// Creating a task debits the owner's wallet by the escrow amount; deleting
/// one refunds whatever escrow is left. Both run under a single store guard
/// so the balance check, the ledger entry and the task write are one unit.
pub struct TaskRegistry {
    store: Arc<Store>,
}

impl TaskRegistry {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, owner: Uuid, request: CreateTaskRequest) -> AppResult<Task> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if request.pay_per_view <= Decimal::ZERO {
            return Err(AppError::Validation("pay per view must be positive".into()));
        }
        // Escrow must fund at least one completion including the platform fee
        if request.set_amount < request.pay_per_view * TOTAL_COST_RATE {
            return Err(AppError::Validation(
                "set amount does not cover a single paid view".into(),
            ));
        }

        let mut state = self.store.write().await;
        let now = Utc::now();
        state.account(owner)?;

        let task = Task {
            id: Uuid::new_v4(),
            owner,
            name: request.name,
            unique_id: request.unique_id,
            target_url: request.target_url,
            target_views: request.target_views,
            pay_per_view: request.pay_per_view,
            set_amount: request.set_amount,
            hits: 0,
            status: TaskStatus::Active,
            approved: true,
            created_at: now,
        };

        // Fails with InsufficientFunds before the task exists
        state.debit(owner, Some(task.id), request.set_amount, now)?;
        state.tasks.insert(task.id, task.clone());

        info!(task = %task.id, %owner, escrow = %task.set_amount, "task created");
        Ok(task)
    }

    pub async fn pause(&self, owner: Uuid, task_id: Uuid) -> AppResult<()> {
        self.set_status(owner, task_id, TaskStatus::Paused).await
    }

    pub async fn publish(&self, owner: Uuid, task_id: Uuid) -> AppResult<()> {
        self.set_status(owner, task_id, TaskStatus::Active).await
    }

    async fn set_status(&self, owner: Uuid, task_id: Uuid, status: TaskStatus) -> AppResult<()> {
        let mut state = self.store.write().await;
        let task = state
            .tasks
            .get_mut(&task_id)
            .filter(|t| t.owner == owner)
            .ok_or_else(|| AppError::NotFound(format!("task {task_id} not found")))?;
        task.status = status;
        Ok(())
    }

    /// Remove the task and refund its remaining escrow to the owner.
    ///
    /// Reservations against the task are dropped with it; a settlement racing
    /// this delete fails closed with NotFound at task resolution.
    pub async fn delete(&self, owner: Uuid, task_id: Uuid) -> AppResult<()> {
        let mut state = self.store.write().await;
        let now = Utc::now();

        let task = state
            .tasks
            .get(&task_id)
            .filter(|t| t.owner == owner)
            .ok_or_else(|| AppError::NotFound(format!("task {task_id} not found")))?;
        let refund = task.set_amount;

        state.credit(owner, Some(task_id), refund, now)?;
        state.tasks.remove(&task_id);
        state.reservations.retain(|_, r| r.task != task_id);

        info!(task = %task_id, %owner, %refund, "task deleted, escrow refunded");
        Ok(())
    }

    /// Tasks the worker can start right now: approved, active, not their own,
    /// not already attempted, and with capacity left after live reservations.
    pub async fn list_available(
        &self,
        worker: Uuid,
        page: usize,
        limit: usize,
    ) -> AppResult<(Vec<Task>, Pagination)> {
        let state = self.store.read().await;
        let now = Utc::now();

        let mut open: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| {
                t.is_open()
                    && t.owner != worker
                    && !state
                        .attempts
                        .get(&(worker, t.id))
                        .map(|a| a.is_live(now))
                        .unwrap_or(false)
                    && t.available_slots(state.live_reservation_count(t.id, now)) > 0
            })
            .cloned()
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(paginate(&open, page, limit))
    }

    /// All of an advertiser's own tasks
    pub async fn my_tasks(&self, owner: Uuid) -> Vec<Task> {
        let state = self.store.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    pub async fn report(&self, worker: Uuid, task_id: Uuid, message: String) -> AppResult<()> {
        if message.trim().is_empty() {
            return Err(AppError::Validation("report message is required".into()));
        }

        let mut state = self.store.write().await;
        if !state.tasks.contains_key(&task_id) {
            return Err(AppError::NotFound(format!("task {task_id} not found")));
        }
        state.reports.push(Report {
            worker,
            task: task_id,
            message,
            created_at: Utc::now(),
        });
        Ok(())
    }

    /// Paged attempt log for a worker, newest first
    pub async fn attempt_log(
        &self,
        worker: Uuid,
        page: usize,
        limit: usize,
    ) -> (Vec<AttemptRecord>, Pagination) {
        let state = self.store.read().await;
        let log = state.attempts_for(worker, Utc::now());
        paginate(&log, page, limit)
    }
}
