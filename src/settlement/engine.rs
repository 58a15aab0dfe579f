use crate::error::{AppError, AppResult};
use crate::referral::ReferralResolver;
use crate::settlement::{PLATFORM_FEE_RATE, REFERRAL_COMMISSION_RATE};
use crate::store::Store;
use crate::tasks::models::AttemptRecord;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Settlement engine - converts a live reservation into a paid, logged,
/// fee-split completion.
///
/// The whole settlement runs under one store write guard: every check comes
/// before the first mutation, so a failed settlement leaves no trace and a
/// successful one commits the task, attempt, wallets and transaction records
/// together.
pub struct SettlementEngine {
    store: Arc<Store>,
    admin: Uuid,
}

impl SettlementEngine {
    pub fn new(store: Arc<Store>, admin: Uuid) -> Self {
        Self { store, admin }
    }

    /// Settle the completion signalled by (advertiser, unique_id) for `worker`
    pub async fn verify_completion(
        &self,
        worker: Uuid,
        owner: Uuid,
        unique_id: &str,
    ) -> AppResult<()> {
        let mut state = self.store.write().await;
        let now = Utc::now();

        let (task_id, pay_per_view, escrow) = {
            let task = state
                .tasks
                .values()
                .find(|t| t.owner == owner && t.unique_id == unique_id)
                .ok_or_else(|| AppError::NotFound("task not found".into()))?;
            (task.id, task.pay_per_view, task.set_amount)
        };

        // At-most-once guard: the finalized attempt record outlives the
        // reservation and rejects every later verification.
        if state
            .attempts
            .get(&(worker, task_id))
            .map(|a| a.completed)
            .unwrap_or(false)
        {
            return Err(AppError::AlreadySettled);
        }

        // The live reservation is the sole gate against replay from a worker
        // who never started the task.
        if !state.reservation_is_live(worker, task_id, now) {
            return Err(AppError::InvalidOrExpiredAttempt);
        }

        let payout = pay_per_view;
        let fee = pay_per_view * PLATFORM_FEE_RATE;
        let deductible = payout + fee;

        // Escrow bound: abort before any wallet mutation
        if escrow < deductible {
            return Err(AppError::TaskDepleted);
        }

        // Pre-flight every credited account so the mutation block cannot
        // fail halfway through.
        state.account(worker)?;
        state.account(self.admin)?;
        let referrer = state
            .account(worker)?
            .referred_by
            .clone()
            .and_then(|code| ReferralResolver::resolve(&state, &code).map(|a| a.id));

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or_else(|| AppError::Internal("task vanished mid-settlement".into()))?;
        task.hits += 1;
        task.target_views -= 1;
        task.set_amount -= deductible;

        let attempt = state
            .attempts
            .entry((worker, task_id))
            .or_insert_with(|| AttemptRecord {
                worker,
                task: task_id,
                payment: Decimal::ZERO,
                completed: false,
                created_at: now,
            });
        attempt.payment = payout;
        attempt.completed = true;

        state.credit(worker, Some(task_id), payout, now)?;
        match referrer {
            Some(referrer_id) => {
                let commission = pay_per_view * REFERRAL_COMMISSION_RATE;
                state.credit(referrer_id, Some(task_id), commission, now)?;
                state.credit(self.admin, Some(task_id), fee - commission, now)?;
            }
            None => {
                state.credit(self.admin, Some(task_id), fee, now)?;
            }
        }

        state.reservations.remove(&(worker, task_id));

        info!(%worker, task = %task_id, %payout, %fee, "completion settled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::models::{Account, AccountStatus, Role};
    use crate::slots::SlotManager;
    use crate::tasks::models::{CreateTaskRequest, Task};
    use crate::tasks::TaskRegistry;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: Arc<Store>,
        registry: TaskRegistry,
        slots: SlotManager,
        engine: SettlementEngine,
        admin: Uuid,
        advertiser: Uuid,
        worker: Uuid,
        referrer: Uuid,
    }

    fn account(email: &str, wallet: Decimal, role: Role, code: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: email.into(),
            country: None,
            wallet,
            role,
            status: AccountStatus::Active,
            verified: true,
            referral_code: code.into(),
            referred_by: None,
            session: None,
            created_at: Utc::now(),
        }
    }

    async fn fixture(worker_referred: bool) -> Fixture {
        let store = Arc::new(Store::new());
        let admin = account("admin@example.com", dec!(0), Role::Admin, "ADMIN0");
        let advertiser = account("adv@example.com", dec!(100.00), Role::Worker, "ADVERT");
        let referrer = account("ref@example.com", dec!(0), Role::Worker, "REFER1");
        let mut worker = account("worker@example.com", dec!(0), Role::Worker, "WORKR1");
        if worker_referred {
            worker.referred_by = Some("REFER1".into());
        }

        let ids = (admin.id, advertiser.id, worker.id, referrer.id);
        {
            let mut state = store.write().await;
            for acct in [admin, advertiser, worker, referrer] {
                state.accounts.insert(acct.id, acct);
            }
        }

        Fixture {
            registry: TaskRegistry::new(store.clone()),
            slots: SlotManager::new(store.clone()),
            engine: SettlementEngine::new(store.clone(), ids.0),
            store,
            admin: ids.0,
            advertiser: ids.1,
            worker: ids.2,
            referrer: ids.3,
        }
    }

    async fn create_task(fx: &Fixture, target_views: i64, set_amount: Decimal) -> Task {
        fx.registry
            .create(
                fx.advertiser,
                CreateTaskRequest {
                    name: "visit link".into(),
                    unique_id: "abc123".into(),
                    target_url: "https://example.com/r/abc123".into(),
                    target_views,
                    pay_per_view: dec!(1.00),
                    set_amount,
                },
            )
            .await
            .unwrap()
    }

    async fn balance(fx: &Fixture, id: Uuid) -> Decimal {
        fx.store.read().await.account(id).unwrap().wallet
    }

    #[tokio::test]
    async fn settlement_without_referrer_pays_worker_and_admin() {
        let fx = fixture(false).await;
        let task = create_task(&fx, 1, dec!(1.25)).await;

        fx.slots.start_attempt(fx.worker, task.id).await.unwrap();
        fx.engine
            .verify_completion(fx.worker, fx.advertiser, "abc123")
            .await
            .unwrap();

        assert_eq!(balance(&fx, fx.worker).await, dec!(1.00));
        assert_eq!(balance(&fx, fx.admin).await, dec!(0.25));
        assert_eq!(balance(&fx, fx.referrer).await, dec!(0));

        let state = fx.store.read().await;
        let settled = &state.tasks[&task.id];
        assert_eq!(settled.hits, 1);
        assert_eq!(settled.target_views, 0);
        assert_eq!(settled.set_amount, dec!(0.00));
        assert!(state.reservations.is_empty());
        assert!(state.attempts[&(fx.worker, task.id)].completed);
        assert_eq!(state.attempts[&(fx.worker, task.id)].payment, dec!(1.00));
    }

    #[tokio::test]
    async fn settlement_with_referrer_splits_the_fee() {
        let fx = fixture(true).await;
        let task = create_task(&fx, 1, dec!(1.25)).await;

        fx.slots.start_attempt(fx.worker, task.id).await.unwrap();
        fx.engine
            .verify_completion(fx.worker, fx.advertiser, "abc123")
            .await
            .unwrap();

        // 5% of pay_per_view to the referrer, the remaining 20% to admin
        assert_eq!(balance(&fx, fx.worker).await, dec!(1.00));
        assert_eq!(balance(&fx, fx.referrer).await, dec!(0.05));
        assert_eq!(balance(&fx, fx.admin).await, dec!(0.20));
    }

    #[tokio::test]
    async fn second_verification_is_rejected_without_repaying() {
        let fx = fixture(false).await;
        let task = create_task(&fx, 2, dec!(2.50)).await;

        fx.slots.start_attempt(fx.worker, task.id).await.unwrap();
        fx.engine
            .verify_completion(fx.worker, fx.advertiser, "abc123")
            .await
            .unwrap();

        let err = fx
            .engine
            .verify_completion(fx.worker, fx.advertiser, "abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadySettled));
        assert_eq!(balance(&fx, fx.worker).await, dec!(1.00));
        assert_eq!(fx.store.read().await.tasks[&task.id].hits, 1);
    }

    #[tokio::test]
    async fn concurrent_verifications_pay_exactly_once() {
        let fx = fixture(false).await;
        let task = create_task(&fx, 2, dec!(2.50)).await;
        fx.slots.start_attempt(fx.worker, task.id).await.unwrap();

        let engine = Arc::new(SettlementEngine::new(fx.store.clone(), fx.admin));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let engine = engine.clone();
            let (worker, owner) = (fx.worker, fx.advertiser);
            handles.push(tokio::spawn(async move {
                engine.verify_completion(worker, owner, "abc123").await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(balance(&fx, fx.worker).await, dec!(1.00));
    }

    #[tokio::test]
    async fn verification_without_a_reservation_is_rejected() {
        let fx = fixture(false).await;
        create_task(&fx, 1, dec!(1.25)).await;

        let err = fx
            .engine
            .verify_completion(fx.worker, fx.advertiser, "abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOrExpiredAttempt));
        assert_eq!(balance(&fx, fx.worker).await, dec!(0));
    }

    #[tokio::test]
    async fn expired_reservation_cannot_settle() {
        let fx = fixture(false).await;
        let task = create_task(&fx, 1, dec!(1.25)).await;
        fx.slots.start_attempt(fx.worker, task.id).await.unwrap();

        fx.store
            .write()
            .await
            .reservations
            .get_mut(&(fx.worker, task.id))
            .unwrap()
            .created_at = Utc::now() - Duration::minutes(16);

        let err = fx
            .engine
            .verify_completion(fx.worker, fx.advertiser, "abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOrExpiredAttempt));
    }

    #[tokio::test]
    async fn depleted_escrow_aborts_before_any_wallet_mutation() {
        let fx = fixture(false).await;
        let task = create_task(&fx, 2, dec!(1.25)).await;
        fx.slots.start_attempt(fx.worker, task.id).await.unwrap();

        // Drain escrow below one settlement's cost behind the engine's back
        fx.store
            .write()
            .await
            .tasks
            .get_mut(&task.id)
            .unwrap()
            .set_amount = dec!(1.00);

        let err = fx
            .engine
            .verify_completion(fx.worker, fx.advertiser, "abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TaskDepleted));

        let state = fx.store.read().await;
        assert_eq!(state.account(fx.worker).unwrap().wallet, dec!(0));
        assert_eq!(state.account(fx.admin).unwrap().wallet, dec!(0));
        assert_eq!(state.tasks[&task.id].hits, 0);
        // Reservation stays; the worker may retry or let it expire
        assert!(state.reservation_is_live(fx.worker, task.id, Utc::now()));
    }

    #[tokio::test]
    async fn settlement_against_a_deleted_task_fails_closed() {
        let fx = fixture(false).await;
        let task = create_task(&fx, 1, dec!(1.25)).await;
        fx.slots.start_attempt(fx.worker, task.id).await.unwrap();

        fx.registry.delete(fx.advertiser, task.id).await.unwrap();

        let err = fx
            .engine
            .verify_completion(fx.worker, fx.advertiser, "abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn suspended_referrer_forfeits_commission_to_admin() {
        let fx = fixture(true).await;
        let task = create_task(&fx, 1, dec!(1.25)).await;
        fx.store
            .write()
            .await
            .accounts
            .get_mut(&fx.referrer)
            .unwrap()
            .status = AccountStatus::Suspended;

        fx.slots.start_attempt(fx.worker, task.id).await.unwrap();
        fx.engine
            .verify_completion(fx.worker, fx.advertiser, "abc123")
            .await
            .unwrap();

        assert_eq!(balance(&fx, fx.referrer).await, dec!(0));
        assert_eq!(balance(&fx, fx.admin).await, dec!(0.25));
    }
}
