use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Attempt records double as completion receipts and the "already seen"
/// exclusion list for task listing; they age out after this window.
pub const ATTEMPT_RETENTION_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Paused,
}

/// Task entity - a funded view campaign
///
/// `target_views` is the remaining capacity and `set_amount` the remaining
/// escrow; both only ever decrease while `hits` only increases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    /// Correlates the out-of-band completion signal with this task
    pub unique_id: String,
    pub target_url: String,
    pub target_views: i64,

    #[serde(with = "rust_decimal::serde::float")]
    pub pay_per_view: Decimal,

    /// Escrow funding the remaining payouts and fees
    #[serde(with = "rust_decimal::serde::float")]
    pub set_amount: Decimal,

    pub hits: i64,
    pub status: TaskStatus,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Listable at all: approved, running, and not yet exhausted
    pub fn is_open(&self) -> bool {
        self.approved && self.status == TaskStatus::Active && self.hits < self.target_views
    }

    /// Capacity left once completed hits and in-flight reservations are counted
    pub fn available_slots(&self, live_reservations: i64) -> i64 {
        self.target_views - (self.hits + live_reservations)
    }
}

/// Completion log entry, one per (worker, task) attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub worker: Uuid,
    pub task: Uuid,

    #[serde(with = "rust_decimal::serde::float")]
    pub payment: Decimal,

    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at <= Duration::seconds(ATTEMPT_RETENTION_SECS)
    }
}

/// Audit sink for worker complaints about a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub worker: Uuid,
    pub task: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "task name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "unique id is required"))]
    pub unique_id: String,
    #[validate(url(message = "target url must be a valid http(s) url"))]
    pub target_url: String,
    #[validate(range(min = 1, message = "target views must be positive"))]
    pub target_views: i64,

    #[serde(with = "rust_decimal::serde::float")]
    pub pay_per_view: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub set_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub task_id: Uuid,
}
