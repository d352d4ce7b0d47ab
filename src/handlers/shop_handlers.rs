use axum::extract::{Path, State};
use axum_extra::extract::Query;
use chrono::Utc;
use tracing::{debug, info, instrument};

use super::{ApiResult, CreatedResult, JsonBody, created, ok};
use crate::auth::{AuthUser, ensure_shop_access, ensure_shop_owner, require_role};
use crate::dto::{CreateShopDto, DateQuery, UpdateShopDto};
use crate::errors::ApiError;
use crate::models::{Role, Shop, ShopStats};
use crate::repo;
use crate::state::AppState;

/// Handler for opening a shop
///
/// This function handles POST requests to `/api/shops`. Owners always open
/// shops for themselves; a super admin must name the owning account.
#[instrument(skip(state, actor, payload), fields(name = %payload.name))]
pub async fn create_shop_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    JsonBody(payload): JsonBody<CreateShopDto>,
) -> CreatedResult<Shop> {
    require_role(&actor, &[Role::Owner, Role::SuperAdmin])?;

    let owner_id = match actor.role {
        Role::Owner => actor.id.clone(),
        _ => payload
            .owner_id
            .clone()
            .ok_or_else(|| ApiError::validation("owner_id is required when an admin creates a shop"))?,
    };
    for (field, value) in [("name", &payload.name), ("address", &payload.address), ("phone", &payload.phone)] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("Shop {} is required", field)));
        }
    }

    let shop = repo::create_shop(
        &state.pool,
        payload.name.trim().to_string(),
        payload.address.trim().to_string(),
        payload.phone.trim().to_string(),
        &owner_id,
    )?;

    info!("Created shop {}", shop.id);
    created(shop)
}

/// Handler for listing the shops the caller can see
#[instrument(skip(state, actor), fields(user_id = %actor.id))]
pub async fn list_shops_handler(State(state): State<AppState>, AuthUser(actor): AuthUser) -> ApiResult<Vec<Shop>> {
    let shops = repo::list_shops_for_user(&state.pool, &actor)?;
    debug!("Retrieved {} shops", shops.len());
    ok(shops)
}

#[instrument(skip(state, actor))]
pub async fn get_shop_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Shop> {
    ok(ensure_shop_access(&state.pool, &actor, &shop_id)?)
}

/// Handler for editing a shop's details or closing it
#[instrument(skip(state, actor, payload))]
pub async fn update_shop_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateShopDto>,
) -> ApiResult<Shop> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    let shop = repo::update_shop(&state.pool, &shop_id, &payload)?;
    info!("Updated shop {}", shop.id);
    ok(shop)
}

/// Handler for the shop dashboard figures
///
/// This function handles GET requests to `/api/shops/{id}/stats?date=YYYY-MM-DD`.
/// The date defaults to today in UTC.
#[instrument(skip(state, actor, query))]
pub async fn shop_stats_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<ShopStats> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    ok(repo::shop_stats(&state.pool, &shop_id, date)?)
}

#[cfg(test)]
mod tests {
    use crate::models::Role;
    use crate::test_utils::{fixture, seed_product, seed_user, send, test_app, token_for};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_owner_creates_shop_for_self() {
        let f = fixture();
        let app = test_app(f.pool.clone());
        let token = token_for(&f.owner);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/shops",
            Some(&token),
            Some(json!({"name": "Branch 2", "address": "Saddar, Karachi", "phone": "021-111", "owner_id": f.admin.id})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["owner_id"], f.owner.id.as_str());

        let (_, body) = send(&app, Method::GET, "/api/shops", Some(&token), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_admin_must_name_an_owner() {
        let f = fixture();
        let app = test_app(f.pool.clone());
        let token = token_for(&f.admin);
        let shop = json!({"name": "X", "address": "Y", "phone": "Z"});

        let (status, _) = send(&app, Method::POST, "/api/shops", Some(&token), Some(shop.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut with_worker = shop.clone();
        with_worker["owner_id"] = json!(f.worker.id);
        let (status, _) = send(&app, Method::POST, "/api/shops", Some(&token), Some(with_worker)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut with_owner = shop;
        with_owner["owner_id"] = json!(f.owner.id);
        let (status, _) = send(&app, Method::POST, "/api/shops", Some(&token), Some(with_owner)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_worker_cannot_create_or_edit_shop() {
        let f = fixture();
        let app = test_app(f.pool.clone());
        let token = token_for(&f.worker);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/shops",
            Some(&token),
            Some(json!({"name": "X", "address": "Y", "phone": "Z"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/api/shops/{}", f.shop.id);
        let (status, _) = send(&app, Method::PATCH, &uri, Some(&token), Some(json!({"name": "Mine now"}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_outsider_is_forbidden() {
        let f = fixture();
        let outsider = seed_user(&f.pool, "Other", "other@example.pk", Role::Owner);
        let app = test_app(f.pool.clone());

        let uri = format!("/api/shops/{}", f.shop.id);
        let (status, _) = send(&app, Method::GET, &uri, Some(&token_for(&outsider)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::GET, "/api/shops/missing", Some(&token_for(&f.admin)), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats() {
        let f = fixture();
        seed_product(&f, "A1", 1);
        seed_product(&f, "B2", 10);
        let app = test_app(f.pool.clone());

        let uri = format!("/api/shops/{}/stats?date=2026-01-01", f.shop.id);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token_for(&f.worker)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["product_count"], 2);
        assert_eq!(body["data"]["total_stock_units"], 11);
        assert_eq!(body["data"]["low_stock_count"], 1);
        assert_eq!(body["data"]["inventory_value"], 11 * 80_000);
        assert_eq!(body["data"]["worker_count"], 1);
        assert_eq!(body["data"]["sales_today_count"], 0);
    }
}
