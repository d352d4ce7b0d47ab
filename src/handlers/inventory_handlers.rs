use axum::extract::{Path, State};
use tracing::{info, instrument};

use super::{ApiResult, JsonBody, ok};
use crate::auth::{AuthUser, ensure_shop_access, ensure_shop_owner};
use crate::dto::AdjustInventoryDto;
use crate::errors::ApiError;
use crate::models::{InventoryItem, InventoryView, StockAdjustment};
use crate::repo;
use crate::state::AppState;

#[instrument(skip(state, actor))]
pub async fn list_inventory_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Vec<InventoryView>> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    ok(repo::list_inventory(&state.pool, &shop_id)?)
}

/// Handler for the restock list: rows at or below their product's threshold
#[instrument(skip(state, actor))]
pub async fn low_stock_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Vec<InventoryView>> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    ok(repo::list_low_stock(&state.pool, &shop_id)?)
}

/// Handler for an owner's direct stock correction
///
/// This function handles POST requests to `/api/inventory/{id}/adjust`.
/// Workers file an `INVENTORY_ADJUSTMENT` approval request instead.
#[instrument(skip(state, actor, payload), fields(delta = payload.delta))]
pub async fn adjust_inventory_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(inventory_id): Path<String>,
    JsonBody(payload): JsonBody<AdjustInventoryDto>,
) -> ApiResult<InventoryItem> {
    let item = repo::get_inventory_item(&state.pool, &inventory_id)?
        .ok_or_else(|| ApiError::not_found("Inventory item"))?;
    ensure_shop_owner(&state.pool, &actor, &item.shop_id)?;

    let adjustment = StockAdjustment { delta: payload.delta, reason: payload.reason };
    let item = repo::adjust_inventory(&state.pool, &inventory_id, &adjustment, &actor.id)?;

    info!("Inventory {} now at {}", item.id, item.quantity);
    ok(item)
}

#[cfg(test)]
mod tests {
    use crate::repo;
    use crate::test_utils::{fixture, seed_product, send, test_app, token_for};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_and_low_stock() {
        let f = fixture();
        seed_product(&f, "LOW", 2);
        seed_product(&f, "OK", 9);
        let app = test_app(f.pool.clone());
        let token = token_for(&f.worker);

        let uri = format!("/api/shops/{}/inventory", f.shop.id);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, Method::GET, &format!("{}/low-stock", uri), Some(&token), None).await;
        let low = body["data"].as_array().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0]["sku"], "LOW");
        assert_eq!(low[0]["is_low"], true);
    }

    #[tokio::test]
    async fn test_owner_adjusts_stock() {
        let f = fixture();
        let product = seed_product(&f, "A1", 4);
        let item = repo::get_inventory_for_product(&f.pool, &product.id).unwrap().unwrap();
        let app = test_app(f.pool.clone());
        let uri = format!("/api/inventory/{}/adjust", item.id);

        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token_for(&f.owner)),
            Some(json!({"delta": -1, "reason": "Screen cracked in display"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["quantity"], 3);

        // Stock cannot go below zero
        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token_for(&f.owner)),
            Some(json!({"delta": -10, "reason": "Stock count"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token_for(&f.worker)),
            Some(json!({"delta": 1, "reason": "Found one"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let item = repo::get_inventory_item(&f.pool, &item.id).unwrap().unwrap();
        assert_eq!(item.quantity, 3);
    }

    #[tokio::test]
    async fn test_adjustment_beyond_max_quantity_is_bad_request() {
        let f = fixture();
        let product = seed_product(&f, "A2", 4);
        let item = repo::get_inventory_for_product(&f.pool, &product.id).unwrap().unwrap();
        let app = test_app(f.pool.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/inventory/{}/adjust", item.id),
            Some(&token_for(&f.owner)),
            Some(json!({"delta": i32::MAX, "reason": "Extra zeros"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(repo::get_inventory_item(&f.pool, &item.id).unwrap().unwrap().quantity, 4);
    }
}
