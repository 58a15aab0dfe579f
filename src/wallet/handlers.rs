use axum::{
    extract::{Query, State},
    Json,
};

use crate::api::handler::AppState;
use crate::api::response::{ApiResponse, PageQuery};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::wallet::models::WalletOverview;

/// GET /wallet
pub async fn get_wallet(
    auth: AuthUser,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<WalletOverview>>> {
    let (overview, pagination) = state
        .ledger
        .overview(auth.account_id, query.page(), query.limit())
        .await?;
    Ok(Json(ApiResponse::paged(
        "wallet fetched",
        overview,
        pagination,
    )))
}
