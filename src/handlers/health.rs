use serde_json::{Value, json};

use super::{ApiResult, ok};

/// Handler for the liveness probe at `/api/health`; no authentication
pub async fn health_handler() -> ApiResult<Value> {
    ok(json!({"status": "ok"}))
}
