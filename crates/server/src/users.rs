//! User API endpoints.

use api_types::{
    purchase::PurchaseListResponse,
    user::UserResponse,
};
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{ServerError, purchase::purchase_created, server::ServerState};

pub async fn get(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, ServerError> {
    let user = state.engine.user(user_id).await?;
    Ok(Json(UserResponse {
        id: user.id,
        name: user.name,
        cash_balance: user.cash_balance.to_string(),
    }))
}

/// Handle requests for the purchase ledger of a user
pub async fn purchases(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<PurchaseListResponse>, ServerError> {
    let purchases = state
        .engine
        .user_purchases(user_id)
        .await?
        .into_iter()
        .map(purchase_created)
        .collect();
    Ok(Json(PurchaseListResponse { purchases }))
}
