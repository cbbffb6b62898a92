//! Pharmacy mask catalog endpoint.

use api_types::mask::{Mask, MaskListQuery, MaskListResponse};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use engine::MaskSort;

use crate::{ServerError, server::ServerState};

/// Lists the masks of a pharmacy. `sort` is matched against the known keys
/// before reaching the engine; anything else is rejected.
pub async fn list(
    State(state): State<ServerState>,
    Path(pharmacy_name): Path<String>,
    Query(query): Query<MaskListQuery>,
) -> Result<Json<MaskListResponse>, ServerError> {
    let sort = query
        .sort
        .as_deref()
        .map(str::parse::<MaskSort>)
        .transpose()?
        .unwrap_or_default();

    let masks = state
        .engine
        .pharmacy_masks(&pharmacy_name, sort)
        .await?
        .into_iter()
        .map(|mask| Mask {
            id: mask.id,
            pharmacy_name: mask.pharmacy_name,
            mask_name: mask.mask_name,
            color: mask.color,
            pack_quantity: mask.pack_quantity,
            price: mask.price.to_string(),
        })
        .collect();

    Ok(Json(MaskListResponse { masks }))
}
