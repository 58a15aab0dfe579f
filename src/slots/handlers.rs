use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::api::handler::AppState;
use crate::api::response::{ack, ApiResponse};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::slots::models::StartAttemptResponse;

/// GET /tasks/:id/start
pub async fn start_task(
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<StartAttemptResponse>>> {
    let target_url = state.slots.start_attempt(auth.account_id, task_id).await?;
    Ok(Json(ApiResponse::ok(
        "task session started",
        StartAttemptResponse { target_url },
    )))
}

/// GET /tasks/:id/cancel
pub async fn cancel_task(
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.slots.cancel_attempt(auth.account_id, task_id).await?;
    Ok(Json(ack("task session cancelled")))
}
