use axum::extract::{Path, State};
use axum_extra::extract::Query;
use tracing::{debug, info, instrument};

use super::{ApiResult, CreatedResult, JsonBody, created, ok};
use crate::auth::{AuthUser, ensure_shop_access};
use crate::dto::{CreateSaleDto, DateQuery};
use crate::models::{Sale, SaleWithItems};
use crate::repo;
use crate::state::AppState;

/// Handler for ringing up a sale at the till
///
/// This function handles POST requests to `/api/shops/{id}/sales`. Owners
/// and workers of the shop may sell; stock is taken in the same transaction.
///
/// ### Returns
///
/// The sale with its invoice number and priced lines
#[instrument(skip(state, actor, payload), fields(lines = payload.items.len()))]
pub async fn create_sale_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    JsonBody(payload): JsonBody<CreateSaleDto>,
) -> CreatedResult<SaleWithItems> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    let sale = repo::create_sale(&state.pool, &shop_id, &payload, &actor.id)?;
    info!("Sale {} rung up for {}", sale.sale.invoice_number, sale.sale.total);
    created(sale)
}

#[instrument(skip(state, actor, query))]
pub async fn list_sales_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Vec<Sale>> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    let sales = repo::list_sales(&state.pool, &shop_id, query.date)?;
    debug!("Retrieved {} sales", sales.len());
    ok(sales)
}

#[instrument(skip(state, actor))]
pub async fn get_sale_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(sale_id): Path<String>,
) -> ApiResult<SaleWithItems> {
    let sale = repo::get_sale(&state.pool, &sale_id)?;
    ensure_shop_access(&state.pool, &actor, &sale.sale.shop_id)?;
    ok(sale)
}
