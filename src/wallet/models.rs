use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction records are a rolling window, not a permanent ledger archive
pub const TRANSACTION_RETENTION_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

/// Append-only record of one wallet mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub account: Uuid,
    pub task: Option<Uuid>,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at <= Duration::seconds(TRANSACTION_RETENTION_SECS)
    }
}

#[derive(Debug, Serialize)]
pub struct WalletOverview {
    #[serde(with = "rust_decimal::serde::float")]
    pub wallet_balance: Decimal,
    pub transaction_log: Vec<TransactionRecord>,
}
