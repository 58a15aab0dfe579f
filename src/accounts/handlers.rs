use axum::{extract::State, http::StatusCode, Json};

use crate::accounts::models::{DashboardData, RegisterRequest, RegisterResponse};
use crate::api::handler::AppState;
use crate::api::response::ApiResponse;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// POST /accounts
pub async fn register_account(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    let created = state.directory.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("account registered", created)),
    ))
}

/// GET /dashboard
pub async fn get_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<DashboardData>>> {
    let data = state.directory.dashboard(auth.account_id).await?;
    Ok(Json(ApiResponse::ok("dashboard fetched", data)))
}
