use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use mobile_master::auth::hash_password;
use mobile_master::db::DbPool;
use mobile_master::dto::{CreateProductDto, validate_account_fields};
use mobile_master::models::Role;
use mobile_master::rate_limit::{DatabaseStore, RateLimitStore};
use mobile_master::repo;

use crate::output::{self, OutputConfig, SeedSummary};

const DEMO_OWNER_EMAIL: &str = "owner@demo.pk";
const DEMO_WORKER_EMAIL: &str = "worker@demo.pk";

/// Creates the first (or another) super admin account
pub fn create_super_admin(pool: &DbPool, name: String, email: &str, password: &str, config: &OutputConfig) -> Result<()> {
    validate_account_fields(&name, email, password).map_err(anyhow::Error::msg)?;

    let hash = hash_password(password)?;
    let user = repo::create_user(pool, name.trim().to_string(), email, hash, Role::SuperAdmin)?;
    output::print_user(&user, config);
    Ok(())
}

struct DemoProduct {
    name: &'static str,
    sku: &'static str,
    category: usize,
    brand: usize,
    /// Rupees; stored as paisa
    cost: i64,
    sale: i64,
    stock: i32,
}

const DEMO_CATEGORIES: [&str; 3] = ["Smartphones", "Feature Phones", "Accessories"];
const DEMO_BRANDS: [&str; 4] = ["Samsung", "Infinix", "Nokia", "Anker"];
const DEMO_PRODUCTS: [DemoProduct; 5] = [
    DemoProduct { name: "Galaxy A15 128GB", sku: "SAM-A15-128", category: 0, brand: 0, cost: 45_000, sale: 49_999, stock: 6 },
    DemoProduct { name: "Hot 40i 256GB", sku: "INF-HOT40I", category: 0, brand: 1, cost: 33_500, sale: 36_999, stock: 4 },
    DemoProduct { name: "Nokia 105", sku: "NOK-105", category: 1, brand: 2, cost: 3_500, sale: 3_999, stock: 15 },
    DemoProduct { name: "20W USB-C Charger", sku: "ANK-20W", category: 2, brand: 3, cost: 2_200, sale: 2_999, stock: 25 },
    DemoProduct { name: "Braided USB-C Cable", sku: "ANK-CBL-C", category: 2, brand: 3, cost: 600, sale: 999, stock: 2 },
];

/// Loads a demo owner, shop, worker, and a small catalog with stock
///
/// Refuses to run twice against the same database.
pub fn seed(pool: &DbPool, password: &str, config: &OutputConfig) -> Result<()> {
    if repo::get_user_by_email(pool, DEMO_OWNER_EMAIL)?.is_some() {
        bail!("Demo data already present ({} exists)", DEMO_OWNER_EMAIL);
    }
    validate_account_fields("Demo", DEMO_OWNER_EMAIL, password).map_err(anyhow::Error::msg)?;

    let owner = repo::create_user(
        pool,
        "Bilal Ahmed".to_string(),
        DEMO_OWNER_EMAIL,
        hash_password(password)?,
        Role::Owner,
    )?;
    let shop = repo::create_shop(
        pool,
        "Bilal Mobiles".to_string(),
        "Shop 12, Hafeez Centre, Lahore".to_string(),
        "0300-1234567".to_string(),
        &owner.id,
    )?;
    let worker = repo::add_worker(
        pool,
        &shop.id,
        "Usman Tariq".to_string(),
        DEMO_WORKER_EMAIL,
        hash_password(password)?,
        &owner.id,
    )?;

    let categories = DEMO_CATEGORIES
        .iter()
        .map(|name| repo::create_category(pool, &shop.id, name))
        .collect::<Result<Vec<_>>>()?;
    let brands = DEMO_BRANDS
        .iter()
        .map(|name| repo::create_brand(pool, &shop.id, name))
        .collect::<Result<Vec<_>>>()?;

    for demo in &DEMO_PRODUCTS {
        let dto = CreateProductDto {
            name: demo.name.to_string(),
            sku: demo.sku.to_string(),
            category_id: Some(categories[demo.category].id.clone()),
            brand_id: Some(brands[demo.brand].id.clone()),
            cost_price: demo.cost * 100,
            sale_price: demo.sale * 100,
            low_stock_threshold: 3,
            initial_stock: demo.stock,
        };
        repo::create_product(pool, &shop.id, &dto, &owner.id)?;
    }

    output::print_seed_summary(
        &SeedSummary {
            shop_id: shop.id,
            owner_email: owner.email,
            worker_email: worker.user.email,
            products: DEMO_PRODUCTS.len(),
        },
        config,
    );
    Ok(())
}

pub fn reconcile_stock(pool: &DbPool, config: &OutputConfig) -> Result<()> {
    let created = repo::reconcile_missing_inventory(pool)?;
    output::print_count("Created", created, "missing inventory rows", config);
    Ok(())
}

/// Deletes database rate-limit hits older than `window_secs`
pub fn purge_rate_limits(pool: DbPool, window_secs: u64, config: &OutputConfig) -> Result<()> {
    let store = DatabaseStore::new(Arc::new(pool));
    let purged = store.purge_expired(Utc::now(), Duration::from_secs(window_secs))?;
    output::print_count("Purged", purged, "expired rate-limit hits", config);
    Ok(())
}
