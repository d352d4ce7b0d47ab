use crate::config::{Config, RateLimitBackend, RateLimitPolicy, base_config};
use crate::db::{self, DbPool};
use crate::models::{InventoryItem, NewProduct, Product, Role, Shop, ShopWorker, User};
use crate::schema::{inventory_items, products, shop_workers, shops, users};
use crate::state::AppState;
use crate::{auth, create_app, run_migrations};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use diesel::prelude::*;
use proptest::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Sets up a test database with migrations applied
///
/// Each call gets its own named in-memory database. Plain `:memory:` gives
/// every pooled connection a separate database, so the URI uses
/// `cache=shared` to let the pool's connections see the same schema.
pub fn setup_test_db() -> Arc<DbPool> {
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url).expect("Failed to create test pool");

    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn).expect("Failed to run migrations");

    Arc::new(pool)
}

/// Generates strings with surrounding whitespace, unicode, and punctuation
pub fn arb_messy_string() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_./:-]{0,24}",
        "\\PC{0,16}",
        " {0,3}[a-z]{1,8} {0,3}",
    ]
}

/// Inserts an active user with a placeholder password hash
///
/// The hash is not a valid PHC string, so these users cannot sign in. Tests
/// that exercise sign-in hash a real password with [`seed_user_with_password`].
pub fn seed_user(pool: &DbPool, name: &str, email: &str, role: Role) -> User {
    let user = User::new(name.to_string(), email, "not-a-real-hash".to_string(), role);
    let conn = &mut pool.get().unwrap();
    diesel::insert_into(users::table).values(&user).execute(conn).unwrap();
    user
}

pub fn seed_user_with_password(pool: &DbPool, email: &str, password: &str, role: Role) -> User {
    let hash = auth::hash_password(password).unwrap();
    let user = User::new("Signed In".to_string(), email, hash, role);
    let conn = &mut pool.get().unwrap();
    diesel::insert_into(users::table).values(&user).execute(conn).unwrap();
    user
}

/// A super admin, an owner with one shop, and one worker in that shop
pub struct Fixture {
    pub pool: Arc<DbPool>,
    pub admin: User,
    pub owner: User,
    pub shop: Shop,
    pub worker: User,
}

/// Builds a [`Fixture`] by inserting rows directly, so no audit entries are written
pub fn fixture() -> Fixture {
    let pool = setup_test_db();
    let admin = seed_user(&pool, "Platform Admin", "admin@example.pk", Role::SuperAdmin);
    let owner = seed_user(&pool, "Bilal Ahmed", "bilal@example.pk", Role::Owner);
    let worker = seed_user(&pool, "Usman Tariq", "usman@example.pk", Role::Worker);

    let shop = Shop::new(
        "Bilal Mobiles".to_string(),
        "Hall Road, Lahore".to_string(),
        "0300-1234567".to_string(),
        owner.id.clone(),
    );
    let conn = &mut pool.get().unwrap();
    diesel::insert_into(shops::table).values(&shop).execute(conn).unwrap();
    diesel::insert_into(shop_workers::table)
        .values(&ShopWorker::new(shop.id.clone(), worker.id.clone()))
        .execute(conn)
        .unwrap();

    Fixture { pool, admin, owner, shop, worker }
}

/// Inserts a product priced at Rs 1,000 sale / Rs 800 cost with `quantity` in stock
pub fn seed_product(f: &Fixture, sku: &str, quantity: i32) -> Product {
    let product = Product::new(NewProduct {
        shop_id: f.shop.id.clone(),
        category_id: None,
        brand_id: None,
        name: format!("Product {}", sku),
        sku: sku.to_string(),
        cost_price: 80_000,
        sale_price: 100_000,
        low_stock_threshold: 2,
    });
    let conn = &mut f.pool.get().unwrap();
    diesel::insert_into(products::table).values(&product).execute(conn).unwrap();
    diesel::insert_into(inventory_items::table)
        .values(&InventoryItem::new(f.shop.id.clone(), product.id.clone(), quantity))
        .execute(conn)
        .unwrap();
    product
}

/// Configuration for handler tests: in-memory rate limits high enough not to interfere
pub fn test_config() -> Config {
    Config {
        jwt_secret: "test-secret".to_string(),
        rate_limit_backend: RateLimitBackend::Memory,
        api_rate_limit: RateLimitPolicy { max_requests: 10_000, window_secs: 60 },
        ..base_config(None)
    }
}

pub fn test_app(pool: Arc<DbPool>) -> Router {
    create_app(AppState::new(pool, &test_config()))
}

pub fn token_for(user: &User) -> String {
    let config = test_config();
    auth::create_token(&config.jwt_secret, config.token_ttl_hours, &user.id).unwrap().0
}

/// Sends one request through the router and decodes the JSON body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, json)
}

#[test]
fn test_setup_test_db_is_isolated() {
    let first = setup_test_db();
    let second = setup_test_db();
    seed_user(&first, "A", "a@example.pk", Role::Owner);

    let conn = &mut second.get().unwrap();
    let count: i64 = users::table.count().get_result(conn).unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_fixture_links_worker() {
    let f = fixture();
    let conn = &mut f.pool.get().unwrap();
    let links: i64 = shop_workers::table
        .filter(shop_workers::shop_id.eq(&f.shop.id))
        .count()
        .get_result(conn)
        .unwrap();
    assert_eq!(links, 1);
}
