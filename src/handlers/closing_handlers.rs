use axum::extract::{Path, State};
use chrono::Utc;
use tracing::{info, instrument};

use super::{ApiResult, CreatedResult, JsonBody, created, ok};
use crate::auth::{AuthUser, ensure_shop_access};
use crate::dto::CreateDailyClosingDto;
use crate::errors::ApiError;
use crate::models::{ClosingInput, DailyClosing};
use crate::repo;
use crate::state::AppState;

/// Handler for closing the day
///
/// This function handles POST requests to `/api/shops/{id}/daily-closings`.
/// The day's sales are totalled by payment method and compared against the
/// cash counted in the drawer.
///
/// ### Returns
///
/// The closing with `expected_cash` and `difference` filled in
#[instrument(skip(state, actor, payload))]
pub async fn create_daily_closing_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    JsonBody(payload): JsonBody<CreateDailyClosingDto>,
) -> CreatedResult<DailyClosing> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    payload.validate().map_err(ApiError::Validation)?;

    let input = ClosingInput {
        closing_date: payload.closing_date.unwrap_or_else(|| Utc::now().date_naive()),
        opening_cash: payload.opening_cash,
        expenses: payload.expenses,
        actual_cash: payload.actual_cash,
        notes: payload.notes,
    };
    let closing = repo::create_daily_closing(&state.pool, &shop_id, &actor.id, input)?;

    info!("Shop {} closed {}", shop_id, closing.closing_date);
    created(closing)
}

#[instrument(skip(state, actor))]
pub async fn list_daily_closings_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Vec<DailyClosing>> {
    ensure_shop_access(&state.pool, &actor, &shop_id)?;
    ok(repo::list_daily_closings(&state.pool, &shop_id)?)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{fixture, seed_product, send, test_app, token_for};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_close_today_after_cash_sale() {
        let f = fixture();
        let phone = seed_product(&f, "PHN", 3);
        let app = test_app(f.pool.clone());
        let token = token_for(&f.worker);

        let sales = format!("/api/shops/{}/sales", f.shop.id);
        let (status, _) = send(
            &app,
            Method::POST,
            &sales,
            Some(&token),
            Some(json!({"items": [{"product_id": phone.id, "quantity": 1}], "payment_method": "CASH"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/api/shops/{}/daily-closings", f.shop.id);
        let closing = json!({"opening_cash": 500_000, "expenses": 20_000, "actual_cash": 570_000});
        let (status, body) = send(&app, Method::POST, &uri, Some(&token), Some(closing.clone())).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["cash_sales"], 100_000);
        assert_eq!(body["data"]["expected_cash"], 580_000);
        assert_eq!(body["data"]["difference"], -10_000);

        let (status, _) = send(&app, Method::POST, &uri, Some(&token), Some(closing)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, list) = send(&app, Method::GET, &uri, Some(&token_for(&f.owner)), None).await;
        assert_eq!(list["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_negative_cash_is_rejected() {
        let f = fixture();
        let app = test_app(f.pool.clone());

        let uri = format!("/api/shops/{}/daily-closings", f.shop.id);
        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token_for(&f.owner)),
            Some(json!({"closing_date": "2026-02-01", "opening_cash": -1, "actual_cash": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
