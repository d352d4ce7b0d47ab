use axum::extract::{Path, State};
use axum_extra::extract::Query;
use tracing::{debug, info, instrument};

use super::{ApiResult, CreatedResult, JsonBody, created, ok};
use crate::auth::{AuthUser, ensure_shop_owner};
use crate::dto::{CreatePurchaseDto, PurchaseQuery, RecordPaymentDto};
use crate::errors::ApiError;
use crate::models::{Purchase, PurchaseDetail};
use crate::repo;
use crate::state::AppState;

/// Handler for recording stock bought from a supplier
///
/// This function handles POST requests to `/api/shops/{id}/purchases`.
/// Purchases are owner-only since they carry cost prices and supplier credit.
#[instrument(skip(state, actor, payload), fields(supplier = %payload.supplier_name))]
pub async fn create_purchase_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    JsonBody(payload): JsonBody<CreatePurchaseDto>,
) -> CreatedResult<PurchaseDetail> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    let detail = repo::create_purchase(&state.pool, &shop_id, &payload, &actor.id)?;
    info!("Recorded purchase {} ({})", detail.purchase.id, detail.purchase.payment_status);
    created(detail)
}

/// Handler for listing purchases, optionally by `status`
#[instrument(skip(state, actor, query))]
pub async fn list_purchases_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    Query(query): Query<PurchaseQuery>,
) -> ApiResult<Vec<Purchase>> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    let purchases = repo::list_purchases(&state.pool, &shop_id, query.status)?;
    debug!("Retrieved {} purchases", purchases.len());
    ok(purchases)
}

#[instrument(skip(state, actor))]
pub async fn get_purchase_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(purchase_id): Path<String>,
) -> ApiResult<PurchaseDetail> {
    let detail = repo::get_purchase_detail(&state.pool, &purchase_id)?;
    ensure_shop_owner(&state.pool, &actor, &detail.purchase.shop_id)?;
    ok(detail)
}

/// Handler for paying a supplier against a purchase
///
/// This function handles POST requests to `/api/purchases/{id}/payment`.
#[instrument(skip(state, actor, payload), fields(amount = payload.amount))]
pub async fn record_payment_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(purchase_id): Path<String>,
    JsonBody(payload): JsonBody<RecordPaymentDto>,
) -> ApiResult<Purchase> {
    let purchase = repo::get_purchase(&state.pool, &purchase_id)?.ok_or_else(|| ApiError::not_found("Purchase"))?;
    ensure_shop_owner(&state.pool, &actor, &purchase.shop_id)?;

    let purchase = repo::record_payment(&state.pool, &purchase_id, payload.amount, payload.note, &actor.id)?;
    ok(purchase)
}

#[cfg(test)]
mod tests {
    use crate::repo;
    use crate::test_utils::{fixture, seed_product, send, test_app, token_for};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_purchase_on_credit_then_settle() {
        let f = fixture();
        let phone = seed_product(&f, "PHN", 1);
        let app = test_app(f.pool.clone());
        let token = token_for(&f.owner);

        let uri = format!("/api/shops/{}/purchases", f.shop.id);
        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({
                "supplier_name": "Hafeez Centre Traders",
                "items": [{"product_id": phone.id, "quantity": 4, "unit_cost": 75_000}],
                "paid_amount": 100_000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["total_cost"], 300_000);
        assert_eq!(body["data"]["payment_status"], "PARTIAL");
        assert_eq!(body["data"]["payments"].as_array().unwrap().len(), 1);

        let stock = repo::get_inventory_for_product(&f.pool, &phone.id).unwrap().unwrap();
        assert_eq!(stock.quantity, 5);

        let pay_uri = format!("/api/purchases/{}/payment", body["data"]["id"].as_str().unwrap());
        let (status, _) = send(&app, Method::POST, &pay_uri, Some(&token), Some(json!({"amount": 200_001}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, paid) = send(
            &app,
            Method::POST,
            &pay_uri,
            Some(&token),
            Some(json!({"amount": 200_000, "note": "Cleared by cheque"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["data"]["payment_status"], "PAID");

        let (_, settled) = send(&app, Method::GET, &format!("{}?status=PAID", uri), Some(&token), None).await;
        assert_eq!(settled["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_workers_cannot_see_purchases() {
        let f = fixture();
        let app = test_app(f.pool.clone());

        let uri = format!("/api/shops/{}/purchases", f.shop.id);
        let (status, _) = send(&app, Method::GET, &uri, Some(&token_for(&f.worker)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_overpaying_up_front_is_rejected() {
        let f = fixture();
        let phone = seed_product(&f, "PHN", 0);
        let app = test_app(f.pool.clone());

        let uri = format!("/api/shops/{}/purchases", f.shop.id);
        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token_for(&f.owner)),
            Some(json!({
                "supplier_name": "Trader",
                "items": [{"product_id": phone.id, "quantity": 1, "unit_cost": 10}],
                "paid_amount": 11
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let stock = repo::get_inventory_for_product(&f.pool, &phone.id).unwrap().unwrap();
        assert_eq!(stock.quantity, 0);
    }

    #[tokio::test]
    async fn test_max_payment_after_partial_is_bad_request() {
        let f = fixture();
        let phone = seed_product(&f, "PHN", 0);
        let app = test_app(f.pool.clone());
        let token = token_for(&f.owner);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/shops/{}/purchases", f.shop.id),
            Some(&token),
            Some(json!({
                "supplier_name": "Trader",
                "items": [{"product_id": phone.id, "quantity": 2, "unit_cost": 500}],
                "paid_amount": 100
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/purchases/{}/payment", id),
            Some(&token),
            Some(json!({"amount": i64::MAX})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(repo::get_purchase_detail(&f.pool, &id).unwrap().purchase.paid_amount, 100);
    }
}
