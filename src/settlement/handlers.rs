use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::api::handler::AppState;
use crate::api::response::{ack, ApiResponse};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// GET /tasks/:id/:unique_id/verify
///
/// The completion signal carries the advertiser's id and the task's campaign
/// identifier rather than the task id itself; resolution happens inside the
/// engine, under the same guard as the payout.
pub async fn verify_task(
    auth: AuthUser,
    Path((owner, unique_id)): Path<(Uuid, String)>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .settlement
        .verify_completion(auth.account_id, owner, &unique_id)
        .await?;
    Ok(Json(ack("task verified and payout settled")))
}
