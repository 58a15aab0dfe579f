use crate::api::response::{paginate, Pagination};
use crate::error::AppResult;
use crate::store::Store;
use crate::wallet::models::{TransactionRecord, WalletOverview};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Wallet ledger - the only path that mutates account balances.
///
/// Balance check and write happen under one store guard, so concurrent
/// debits can never both observe the same pre-mutation balance.
pub struct WalletLedger {
    store: Arc<Store>,
}

impl WalletLedger {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn credit(&self, account: Uuid, task: Option<Uuid>, amount: Decimal) -> AppResult<()> {
        let mut state = self.store.write().await;
        state.credit(account, task, amount, Utc::now())?;
        info!(%account, %amount, "wallet credited");
        Ok(())
    }

    pub async fn debit(&self, account: Uuid, task: Option<Uuid>, amount: Decimal) -> AppResult<()> {
        let mut state = self.store.write().await;
        state.debit(account, task, amount, Utc::now())?;
        info!(%account, %amount, "wallet debited");
        Ok(())
    }

    /// Balance plus the live transaction log, newest first
    pub async fn overview(
        &self,
        account: Uuid,
        page: usize,
        limit: usize,
    ) -> AppResult<(WalletOverview, Pagination)> {
        let state = self.store.read().await;
        let balance = state.account(account)?.wallet;
        let log: Vec<TransactionRecord> = state.transactions_for(account, Utc::now());
        let (transaction_log, pagination) = paginate(&log, page, limit);
        Ok((
            WalletOverview {
                wallet_balance: balance,
                transaction_log,
            },
            pagination,
        ))
    }
}
