use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::handler::AppState;
use crate::api::response::{ack, ApiResponse, PageQuery};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::tasks::models::{
    AttemptRecord, CreateTaskRequest, CreateTaskResponse, ReportRequest, Task,
};

/// GET /tasks
///
/// A worker with a live reservation gets that task back instead of the
/// listing, so a refresh never buries the session they are in the middle of.
pub async fn list_tasks(
    auth: AuthUser,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Task>>>> {
    if let Some(task) = state.slots.active_task_for(auth.account_id).await {
        return Ok(Json(ApiResponse::ok("active task session found", vec![task])));
    }

    let (tasks, pagination) = state
        .registry
        .list_available(auth.account_id, query.page(), query.limit())
        .await?;
    Ok(Json(ApiResponse::paged("tasks fetched", tasks, pagination)))
}

/// GET /tasks/mine
pub async fn my_tasks(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Task>>>> {
    let tasks = state.registry.my_tasks(auth.account_id).await;
    Ok(Json(ApiResponse::ok("tasks fetched", tasks)))
}

/// POST /tasks
pub async fn create_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreateTaskResponse>>)> {
    let task = state.registry.create(auth.account_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "task created",
            CreateTaskResponse { task_id: task.id },
        )),
    ))
}

/// GET /tasks/:id/pause
pub async fn pause_task(
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.registry.pause(auth.account_id, task_id).await?;
    Ok(Json(ack("task paused")))
}

/// GET /tasks/:id/publish
pub async fn publish_task(
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.registry.publish(auth.account_id, task_id).await?;
    Ok(Json(ack("task published")))
}

/// GET /tasks/:id/delete
pub async fn delete_task(
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.registry.delete(auth.account_id, task_id).await?;
    Ok(Json(ack("task deleted, remaining escrow refunded")))
}

/// POST /tasks/:id/report
pub async fn report_task(
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .registry
        .report(auth.account_id, task_id, request.message)
        .await?;
    Ok(Json(ack("report submitted")))
}

/// GET /tasklog
pub async fn get_task_log(
    auth: AuthUser,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<AttemptRecord>>>> {
    let (log, pagination) = state
        .registry
        .attempt_log(auth.account_id, query.page(), query.limit())
        .await;
    Ok(Json(ApiResponse::paged("task log fetched", log, pagination)))
}
