use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Fixed role set - every capability check resolves against this enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Worker,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "worker" => Some(Role::Worker),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Suspended,
}

/// Account entity
///
/// The wallet balance is mutated only through ledger operations; `session`
/// holds the single valid session marker - rotating it invalidates every
/// previously issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub country: Option<String>,

    #[serde(with = "rust_decimal::serde::float")]
    pub wallet: Decimal,

    pub role: Role,
    pub status: AccountStatus,
    pub verified: bool,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub session: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    pub country: Option<String>,
    pub referred_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub account_id: Uuid,
    pub referral_code: String,
}

/// Per-account dashboard summary (today's figures use UTC midnight)
#[derive(Debug, Serialize)]
pub struct DashboardData {
    #[serde(with = "rust_decimal::serde::float")]
    pub wallet_balance: Decimal,
    pub referral_code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub todays_earning: Decimal,
    pub completed_tasks: u64,
    pub live_campaigns: u64,
}
