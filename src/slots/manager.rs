use crate::error::{AppError, AppResult};
use crate::slots::models::Reservation;
use crate::store::Store;
use crate::tasks::models::{AttemptRecord, Task, TaskStatus};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Slot reservation manager.
///
/// Capacity invariant: a reservation may only be created while
/// `target_views - (hits + live reservations) > 0`. Count, validation and
/// insert all happen under one write guard - two workers racing on the last
/// slot cannot both pass the check.
pub struct SlotManager {
    store: Arc<Store>,
}

impl SlotManager {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Reserve a slot and open an attempt, returning the task's target URL.
    ///
    /// Restarting an attempt the worker already holds is idempotent.
    /// `TaskUnavailable` is the expected outcome when capacity was exhausted
    /// between listing and start - callers should treat it as retry-later.
    pub async fn start_attempt(&self, worker: Uuid, task_id: Uuid) -> AppResult<String> {
        let mut state = self.store.write().await;
        let now = Utc::now();

        if state.reservation_is_live(worker, task_id, now) {
            let task = state
                .tasks
                .get(&task_id)
                .ok_or_else(|| AppError::NotFound(format!("task {task_id} not found")))?;
            return Ok(task.target_url.clone());
        }

        let live = state.live_reservation_count(task_id, now);
        let task = state
            .tasks
            .get(&task_id)
            .ok_or_else(|| AppError::NotFound(format!("task {task_id} not found")))?;

        let open = task.approved
            && task.status == TaskStatus::Active
            && task.hits < task.target_views
            && task.target_views > live;
        if !open {
            return Err(AppError::TaskUnavailable);
        }
        let target_url = task.target_url.clone();

        state.reservations.insert(
            (worker, task_id),
            Reservation {
                worker,
                task: task_id,
                created_at: now,
            },
        );
        state.attempts.insert(
            (worker, task_id),
            AttemptRecord {
                worker,
                task: task_id,
                payment: Decimal::ZERO,
                completed: false,
                created_at: now,
            },
        );

        info!(%worker, %task_id, "slot reserved");
        Ok(target_url)
    }

    /// Release the reservation, freeing its capacity immediately
    pub async fn cancel_attempt(&self, worker: Uuid, task_id: Uuid) -> AppResult<()> {
        let mut state = self.store.write().await;
        let now = Utc::now();

        if !state.reservation_is_live(worker, task_id, now) {
            return Err(AppError::NotFound(
                "no active session found for the specified task".into(),
            ));
        }
        state.reservations.remove(&(worker, task_id));
        info!(%worker, %task_id, "slot released");
        Ok(())
    }

    /// The task behind the worker's live reservation, if one exists
    pub async fn active_task_for(&self, worker: Uuid) -> Option<Task> {
        let state = self.store.read().await;
        let now = Utc::now();
        let reservation = state.live_reservation_for(worker, now)?;
        state.tasks.get(&reservation.task).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn open_task(target_views: i64) -> Task {
        Task {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            name: "visit link".into(),
            unique_id: "abc123".into(),
            target_url: "https://example.com/r/abc123".into(),
            target_views,
            pay_per_view: dec!(1.00),
            set_amount: dec!(12.50),
            hits: 0,
            status: TaskStatus::Active,
            approved: true,
            created_at: Utc::now(),
        }
    }

    async fn store_with(task: Task) -> Arc<Store> {
        let store = Arc::new(Store::new());
        store.write().await.tasks.insert(task.id, task);
        store
    }

    #[tokio::test]
    async fn capacity_is_never_oversold_under_contention() {
        let task = open_task(3);
        let task_id = task.id;
        let store = store_with(task).await;
        let slots = Arc::new(SlotManager::new(store.clone()));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let slots = slots.clone();
            handles.push(tokio::spawn(async move {
                slots.start_attempt(Uuid::new_v4(), task_id).await
            }));
        }

        let mut started = 0;
        let mut unavailable = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => started += 1,
                Err(AppError::TaskUnavailable) => unavailable += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(started, 3);
        assert_eq!(unavailable, 7);
        let state = store.read().await;
        assert_eq!(state.live_reservation_count(task_id, Utc::now()), 3);
    }

    #[tokio::test]
    async fn restart_is_idempotent_and_holds_one_slot() {
        let task = open_task(1);
        let task_id = task.id;
        let store = store_with(task).await;
        let slots = SlotManager::new(store.clone());
        let worker = Uuid::new_v4();

        let url1 = slots.start_attempt(worker, task_id).await.unwrap();
        let url2 = slots.start_attempt(worker, task_id).await.unwrap();
        assert_eq!(url1, url2);
        assert_eq!(
            store.read().await.live_reservation_count(task_id, Utc::now()),
            1
        );
    }

    #[tokio::test]
    async fn expired_reservations_free_capacity() {
        let task = open_task(1);
        let task_id = task.id;
        let store = store_with(task).await;
        let slots = SlotManager::new(store.clone());
        let first = Uuid::new_v4();

        slots.start_attempt(first, task_id).await.unwrap();
        assert!(matches!(
            slots.start_attempt(Uuid::new_v4(), task_id).await,
            Err(AppError::TaskUnavailable)
        ));

        // Age the reservation past its TTL; it must stop counting even
        // though the reaper has not removed it.
        store
            .write()
            .await
            .reservations
            .get_mut(&(first, task_id))
            .unwrap()
            .created_at = Utc::now() - Duration::minutes(16);

        slots.start_attempt(Uuid::new_v4(), task_id).await.unwrap();
        assert!(!store
            .read()
            .await
            .reservation_is_live(first, task_id, Utc::now()));
    }

    #[tokio::test]
    async fn cancel_frees_the_slot_and_is_not_found_twice() {
        let task = open_task(1);
        let task_id = task.id;
        let store = store_with(task).await;
        let slots = SlotManager::new(store);
        let worker = Uuid::new_v4();

        slots.start_attempt(worker, task_id).await.unwrap();
        slots.cancel_attempt(worker, task_id).await.unwrap();
        assert!(matches!(
            slots.cancel_attempt(worker, task_id).await,
            Err(AppError::NotFound(_))
        ));

        // Capacity is back
        slots.start_attempt(Uuid::new_v4(), task_id).await.unwrap();
    }

    #[tokio::test]
    async fn paused_or_unapproved_tasks_cannot_be_started() {
        let mut task = open_task(5);
        task.status = TaskStatus::Paused;
        let task_id = task.id;
        let store = store_with(task).await;
        let slots = SlotManager::new(store.clone());

        assert!(matches!(
            slots.start_attempt(Uuid::new_v4(), task_id).await,
            Err(AppError::TaskUnavailable)
        ));

        store.write().await.tasks.get_mut(&task_id).unwrap().status = TaskStatus::Active;
        store.write().await.tasks.get_mut(&task_id).unwrap().approved = false;
        assert!(matches!(
            slots.start_attempt(Uuid::new_v4(), task_id).await,
            Err(AppError::TaskUnavailable)
        ));
    }
}
