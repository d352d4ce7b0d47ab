//! Mobile Master: shop management for mobile-phone retailers
//!
//! This library provides the data model, repository layer, authentication,
//! rate limiting, and JSON API for a multi-tenant point-of-sale and
//! inventory backend. Each shop is a tenant; users are super admins, shop
//! owners, or workers.
//!
//! ### Modules
//!
//! - `auth`: Password hashing, bearer tokens, and access checks
//! - `config`: Layered configuration (defaults, file, CLI/env)
//! - `db`: Database connection management
//! - `models`: Row structs and domain rules
//! - `rate_limit`: Sliding-window limiter and its middleware
//! - `repo`: Repository layer for database operations
//! - `handlers`: One function per API endpoint
//!
//! ### Web API
//!
//! All routes live under `/api`. Every response is an envelope:
//! `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod repo;
pub mod schema;
pub mod state;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use handlers::*;
use rate_limit::{api_rate_limit, login_rate_limit};
use state::AppState;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates the application router with all routes
///
/// Sign-in and the rest of the API are limited by separate policies. The
/// health check is not rate limited so probes never see a 429.
///
/// ### Arguments
///
/// * `state` - Shared pool, token settings, and rate limiters
///
/// ### Returns
///
/// An Axum Router with every route nested under `/api`
pub fn create_app(state: AppState) -> Router {
    let login = Router::new()
        .route("/auth/login", post(login_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let api = Router::new()
        .route("/auth/me", get(me_handler))
        // Accounts
        .route("/users", post(create_user_handler).get(list_users_handler))
        .route("/users/{id}/status", patch(update_user_status_handler))
        // Shops and staff
        .route("/shops", post(create_shop_handler).get(list_shops_handler))
        .route("/shops/{id}", get(get_shop_handler).patch(update_shop_handler))
        .route("/shops/{id}/stats", get(shop_stats_handler))
        .route("/shops/{id}/workers", post(add_worker_handler).get(list_workers_handler))
        .route("/shops/{id}/workers/{user_id}", delete(remove_worker_handler))
        // Catalog
        .route("/shops/{id}/categories", post(create_category_handler).get(list_categories_handler))
        .route("/shops/{id}/brands", post(create_brand_handler).get(list_brands_handler))
        .route("/shops/{id}/products", post(create_product_handler).get(list_products_handler))
        .route(
            "/products/{id}",
            get(get_product_handler).patch(update_product_handler).delete(delete_product_handler),
        )
        // Stock
        .route("/shops/{id}/inventory", get(list_inventory_handler))
        .route("/shops/{id}/inventory/low-stock", get(low_stock_handler))
        .route("/inventory/{id}/adjust", post(adjust_inventory_handler))
        // Trading
        .route("/shops/{id}/sales", post(create_sale_handler).get(list_sales_handler))
        .route("/sales/{id}", get(get_sale_handler))
        .route("/shops/{id}/purchases", post(create_purchase_handler).get(list_purchases_handler))
        .route("/purchases/{id}", get(get_purchase_handler))
        .route("/purchases/{id}/payment", post(record_payment_handler))
        // Approvals
        .route("/approvals/request", post(request_approval_handler))
        .route("/shops/{id}/approvals", get(list_approvals_handler))
        .route("/approvals/{id}/approve", post(approve_request_handler))
        .route("/approvals/{id}/reject", post(reject_request_handler))
        // Audit, messages, and closings
        .route("/shops/{id}/audit-logs", get(list_audit_logs_handler))
        .route("/shops/{id}/messages", post(send_message_handler).get(list_messages_handler))
        .route("/messages/{id}/read", post(mark_message_read_handler))
        .route(
            "/shops/{id}/daily-closings",
            post(create_daily_closing_handler).get(list_daily_closings_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), api_rate_limit));

    let open = Router::new().route("/health", get(health_handler));

    Router::new()
        .nest("/api", login.merge(api).merge(open))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the embedded migrations
///
/// ### Arguments
///
/// * `conn` - A mutable reference to a SQLite connection
///
/// ### Errors
///
/// Returns an error if any pending migration fails to apply
pub fn run_migrations(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    tracing::debug!("Applied {} migrations", applied.len());
    Ok(())
}
