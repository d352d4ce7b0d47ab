use axum::extract::{Path, State};
use axum_extra::extract::Query;
use tracing::{debug, info, instrument};

use super::{ApiResult, CreatedResult, JsonBody, created, ok};
use crate::auth::{AuthUser, ensure_shop_access, ensure_shop_owner};
use crate::db::DbPool;
use crate::dto::{CreateNamedDto, CreateProductDto, ProductQuery};
use crate::errors::ApiError;
use crate::models::{Brand, Category, Product, ProductPatch, User};
use crate::repo;
use crate::state::AppState;

/// Loads a product and checks the caller can see its shop
fn product_in_reach(pool: &DbPool, actor: &User, product_id: &str) -> Result<Product, ApiError> {
    let product = repo::get_product(pool, product_id)?.ok_or_else(|| ApiError::not_found("Product"))?;
    ensure_shop_access(pool, actor, &product.shop_id)?;
    Ok(product)
}

#[instrument(skip(state, actor, payload))]
pub async fn create_category_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    JsonBody(payload): JsonBody<CreateNamedDto>,
) -> CreatedResult<Category> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    created(repo::create_category(&state.pool, &shop_id, &payload.name)?)
}

#[instrument(skip(state, actor))]
pub async fn list_categories_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Vec<Category>> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    ok(repo::list_categories(&state.pool, &shop_id)?)
}

#[instrument(skip(state, actor, payload))]
pub async fn create_brand_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    JsonBody(payload): JsonBody<CreateNamedDto>,
) -> CreatedResult<Brand> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    created(repo::create_brand(&state.pool, &shop_id, &payload.name)?)
}

#[instrument(skip(state, actor))]
pub async fn list_brands_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Vec<Brand>> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    ok(repo::list_brands(&state.pool, &shop_id)?)
}

/// Handler for adding a product to a shop's catalog
///
/// This function handles POST requests to `/api/shops/{id}/products`. The
/// product's inventory row is created with `initial_stock` units.
#[instrument(skip(state, actor, payload), fields(sku = %payload.sku))]
pub async fn create_product_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    JsonBody(payload): JsonBody<CreateProductDto>,
) -> CreatedResult<Product> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    let product = repo::create_product(&state.pool, &shop_id, &payload, &actor.id)?;
    info!("Created product {}", product.id);
    created(product)
}

/// Handler for searching a shop's active products
///
/// Accepts `search`, `category_id` and `brand_id` query parameters.
#[instrument(skip(state, actor))]
pub async fn list_products_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Vec<Product>> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    let products = repo::list_products(&state.pool, &shop_id, &query)?;
    debug!("Retrieved {} products", products.len());
    ok(products)
}

#[instrument(skip(state, actor))]
pub async fn get_product_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<Product> {
    ok(product_in_reach(&state.pool, &actor, &product_id)?)
}

/// Handler for editing a product directly
///
/// Only the shop owner may do this; workers go through an approval request.
#[instrument(skip(state, actor, patch))]
pub async fn update_product_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(product_id): Path<String>,
    JsonBody(patch): JsonBody<ProductPatch>,
) -> ApiResult<Product> {
    let product = product_in_reach(&state.pool, &actor, &product_id)?;
    ensure_shop_owner(&state.pool, &actor, &product.shop_id)?;
    ok(repo::update_product(&state.pool, &product_id, &patch, &actor.id)?)
}

/// Handler for removing a product from sale
///
/// The product is deactivated rather than deleted so past sales keep their lines.
#[instrument(skip(state, actor))]
pub async fn delete_product_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<()> {
    let product = product_in_reach(&state.pool, &actor, &product_id)?;
    ensure_shop_owner(&state.pool, &actor, &product.shop_id)?;
    repo::deactivate_product(&state.pool, &product_id, &actor.id)?;
    ok(())
}
