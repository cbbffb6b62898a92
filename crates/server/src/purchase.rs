//! Purchase API endpoint.

use api_types::purchase::{PurchaseCreated, PurchaseNew};
use axum::{Json, extract::State, http::StatusCode};
use engine::{PurchaseCmd, PurchaseRecord};

use crate::{ServerError, server::ServerState};

pub(crate) fn purchase_created(record: PurchaseRecord) -> PurchaseCreated {
    PurchaseCreated {
        id: record.id,
        user_id: record.user_id,
        pharmacy_name: record.pharmacy_name,
        mask_id: record.mask_id,
        trn_amount: record.trn_amount.to_string(),
        trn_date: record.trn_date,
    }
}

pub async fn purchase_new(
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseNew>,
) -> Result<(StatusCode, Json<PurchaseCreated>), ServerError> {
    let mut cmd = PurchaseCmd::new(payload.user_id, payload.pharmacy_id, payload.mask_id);
    if let Some(key) = payload.idempotency_key {
        cmd = cmd.idempotency_key(key);
    }
    let record = state.engine.purchase(cmd).await?;

    Ok((StatusCode::CREATED, Json(purchase_created(record))))
}
