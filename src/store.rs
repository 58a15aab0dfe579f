use crate::accounts::models::Account;
use crate::error::{AppError, AppResult};
use crate::slots::models::Reservation;
use crate::tasks::models::{AttemptRecord, Report, Task};
use crate::wallet::models::{TransactionKind, TransactionRecord};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// The store - THE source of truth for all durable state.
///
/// Every mutation that derives a new value from a stored one (balances,
/// capacity counters, reservation existence) runs under a single write guard,
/// so the check and the write are one atomic operation. A guard held across
/// the settlement engine's multi-entity mutation is one logical transaction.
pub struct Store {
    inner: RwLock<State>,
}

/// Full entity state, keyed the way the settlement path looks things up
#[derive(Default)]
pub struct State {
    pub accounts: HashMap<Uuid, Account>,
    pub tasks: HashMap<Uuid, Task>,
    /// Keyed by (worker, task): at most one reservation per pair
    pub reservations: HashMap<(Uuid, Uuid), Reservation>,
    pub attempts: HashMap<(Uuid, Uuid), AttemptRecord>,
    pub transactions: Vec<TransactionRecord>,
    pub reports: Vec<Report>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(State::default()),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.write().await
    }

    /// Physically drop records past their TTL. Capacity arithmetic never
    /// depends on this running; reads already treat stale records as absent.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> (usize, usize, usize) {
        let mut state = self.inner.write().await;

        let before_res = state.reservations.len();
        state.reservations.retain(|_, r| r.is_live(now));
        let before_att = state.attempts.len();
        state.attempts.retain(|_, a| a.is_live(now));
        let before_txn = state.transactions.len();
        state.transactions.retain(|t| t.is_live(now));

        (
            before_res - state.reservations.len(),
            before_att - state.attempts.len(),
            before_txn - state.transactions.len(),
        )
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub fn account(&self, id: Uuid) -> AppResult<&Account> {
        self.accounts
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("account {id} not found")))
    }

    /// Credit `amount` to an account and append the matching transaction record
    pub fn credit(
        &mut self,
        account_id: Uuid,
        task: Option<Uuid>,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let account = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| AppError::NotFound(format!("account {account_id} not found")))?;
        account.wallet += amount;
        self.transactions.push(TransactionRecord {
            id: Uuid::new_v4(),
            account: account_id,
            task,
            amount,
            kind: TransactionKind::Credit,
            created_at: now,
        });
        Ok(())
    }

    /// Debit `amount`, failing before any mutation if the balance would go
    /// negative. The balance check and the write share this guard.
    pub fn debit(
        &mut self,
        account_id: Uuid,
        task: Option<Uuid>,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let account = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| AppError::NotFound(format!("account {account_id} not found")))?;
        if account.wallet < amount {
            return Err(AppError::InsufficientFunds);
        }
        account.wallet -= amount;
        self.transactions.push(TransactionRecord {
            id: Uuid::new_v4(),
            account: account_id,
            task,
            amount,
            kind: TransactionKind::Debit,
            created_at: now,
        });
        Ok(())
    }

    /// Count reservations that still hold capacity on this task
    pub fn live_reservation_count(&self, task: Uuid, now: DateTime<Utc>) -> i64 {
        self.reservations
            .values()
            .filter(|r| r.task == task && r.is_live(now))
            .count() as i64
    }

    pub fn reservation_is_live(&self, worker: Uuid, task: Uuid, now: DateTime<Utc>) -> bool {
        self.reservations
            .get(&(worker, task))
            .map(|r| r.is_live(now))
            .unwrap_or(false)
    }

    /// The worker's first live reservation, if any
    pub fn live_reservation_for(&self, worker: Uuid, now: DateTime<Utc>) -> Option<&Reservation> {
        self.reservations
            .values()
            .find(|r| r.worker == worker && r.is_live(now))
    }

    /// Live transaction records for an account, newest first
    pub fn transactions_for(&self, account: Uuid, now: DateTime<Utc>) -> Vec<TransactionRecord> {
        let mut log: Vec<TransactionRecord> = self
            .transactions
            .iter()
            .filter(|t| t.account == account && t.is_live(now))
            .cloned()
            .collect();
        log.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        log
    }

    /// Live attempt records for a worker, newest first
    pub fn attempts_for(&self, worker: Uuid, now: DateTime<Utc>) -> Vec<AttemptRecord> {
        let mut log: Vec<AttemptRecord> = self
            .attempts
            .values()
            .filter(|a| a.worker == worker && a.is_live(now))
            .cloned()
            .collect();
        log.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        log
    }
}
