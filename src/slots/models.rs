use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reservation past this age is treated as absent by every capacity
/// computation, whether or not the reaper has removed it yet.
pub const RESERVATION_TTL_SECS: i64 = 15 * 60;

/// In-flight claim on one unit of a task's remaining capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub worker: Uuid,
    pub task: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at <= Duration::seconds(RESERVATION_TTL_SECS)
    }
}

/// Payload returned when an attempt is opened
#[derive(Debug, Serialize)]
pub struct StartAttemptResponse {
    pub target_url: String,
}
