use axum::extract::{Path, State};
use axum_extra::extract::Query;
use tracing::{debug, instrument};

use super::{ApiResult, ok};
use crate::auth::{AuthUser, ensure_shop_owner};
use crate::dto::AuditLogQuery;
use crate::models::AuditLog;
use crate::repo;
use crate::state::AppState;

/// Handler for a shop's audit trail
///
/// This function handles GET requests to `/api/shops/{id}/audit-logs?limit=N`.
/// The limit defaults to 100 and is capped at 500.
#[instrument(skip(state, actor, query))]
pub async fn list_audit_logs_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(shop_id): Path<String>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Vec<AuditLog>> {
    ensure_shop_owner(&state.pool, &actor, &shop_id)?;
    let entries = repo::list_audit_logs(&state.pool, &shop_id, query.limit)?;
    debug!("Retrieved {} audit entries", entries.len());
    ok(entries)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{fixture, send, test_app, token_for};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_actions_show_up_in_audit_log() {
        let f = fixture();
        let app = test_app(f.pool.clone());
        let token = token_for(&f.owner);

        let uri = format!("/api/shops/{}/products", f.shop.id);
        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({"name": "Nokia 105", "sku": "NOK-105", "cost_price": 350_000, "sale_price": 399_900})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/api/shops/{}/audit-logs?limit=10", f.shop.id);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["action"], "PRODUCT_CREATED");
        assert_eq!(entries[0]["user_id"], f.owner.id.as_str());
    }

    #[tokio::test]
    async fn test_workers_cannot_read_audit_log() {
        let f = fixture();
        let app = test_app(f.pool.clone());

        let uri = format!("/api/shops/{}/audit-logs", f.shop.id);
        let (status, _) = send(&app, Method::GET, &uri, Some(&token_for(&f.worker)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
