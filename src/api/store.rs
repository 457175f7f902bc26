//! Store API endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::{PurchaseRecord, PurchaseRequest, StoreItem, ToggleUsageRequest};
use crate::AppState;

use super::require_user;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItemsResponse {
    pub store_items: Vec<StoreItem>,
}

/// GET /api/store - List the catalog.
pub async fn list_store_items(
    State(state): State<AppState>,
) -> Result<Json<StoreItemsResponse>, AppError> {
    let store_items = state.repo.list_store_items().await?;
    Ok(Json(StoreItemsResponse { store_items }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub success: bool,
    pub purchase: PurchaseRecord,
    #[serde(rename = "newXP")]
    pub new_xp: i64,
    pub message: String,
}

/// POST /api/store/purchase - Buy an item.
pub async fn purchase(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    if request.item_id.is_empty() {
        return Err(AppError::Validation("Item ID is required".to_string()));
    }

    let user = require_user(&state, &session).await?;
    let item = state
        .repo
        .get_store_item(&request.item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Store item not found".to_string()))?;

    let (purchase, new_xp) = state.repo.purchase(&user, &item).await?;
    let message = format!(
        "Successfully purchased {} for {} XP!",
        item.name, item.xp_price
    );

    Ok(Json(PurchaseResponse {
        success: true,
        purchase,
        new_xp,
        message,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleUsageResponse {
    pub success: bool,
    pub message: String,
    pub updated_item: PurchaseRecord,
}

/// POST /api/store/toggle-usage - Flip the used flag on a purchase.
pub async fn toggle_usage(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ToggleUsageRequest>,
) -> Result<Json<ToggleUsageResponse>, AppError> {
    let (Some(purchase_index), Some(mark_as_used)) =
        (request.purchase_index, request.mark_as_used)
    else {
        return Err(AppError::Validation("Invalid parameters".to_string()));
    };
    if purchase_index < 0 {
        return Err(AppError::Validation("Invalid purchase index".to_string()));
    }

    let user = require_user(&state, &session).await?;
    let updated_item = state
        .repo
        .toggle_usage(&user, purchase_index as usize, mark_as_used)
        .await?;

    let message = format!(
        "Item marked as {}",
        if mark_as_used { "used" } else { "unused" }
    );

    Ok(Json(ToggleUsageResponse {
        success: true,
        message,
        updated_item,
    }))
}
