use crate::db::DbPool;
use crate::dto::{CreateProductDto, ProductQuery};
use crate::models::{AuditLog, Brand, Category, InventoryItem, NewProduct, Product, ProductPatch};
use crate::schema::{brands, categories, inventory_items, products};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{conflict, not_found, record_audit, validation};

/// Creates a category in a shop
///
/// ### Errors
///
/// Returns a `Conflict` if the shop already has a category with that name
#[instrument(skip(pool))]
pub fn create_category(pool: &DbPool, shop_id: &str, name: &str) -> Result<Category> {
    let conn = &mut pool.get()?;
    let name = name.trim();
    if name.is_empty() {
        return Err(validation("Category name is required"));
    }

    let exists = categories::table
        .filter(categories::shop_id.eq(shop_id))
        .filter(categories::name.eq(name))
        .count()
        .get_result::<i64>(conn)?;
    if exists > 0 {
        return Err(conflict(format!("Category {} already exists", name)));
    }

    let category = Category::new(shop_id.to_string(), name.to_string());
    diesel::insert_into(categories::table).values(&category).execute(conn)?;

    info!("Created category {}", category.id);
    Ok(category)
}

#[instrument(skip(pool))]
pub fn list_categories(pool: &DbPool, shop_id: &str) -> Result<Vec<Category>> {
    let conn = &mut pool.get()?;
    Ok(categories::table
        .filter(categories::shop_id.eq(shop_id))
        .order(categories::name.asc())
        .load::<Category>(conn)?)
}

/// Creates a brand in a shop
///
/// ### Errors
///
/// Returns a `Conflict` if the shop already has a brand with that name
#[instrument(skip(pool))]
pub fn create_brand(pool: &DbPool, shop_id: &str, name: &str) -> Result<Brand> {
    let conn = &mut pool.get()?;
    let name = name.trim();
    if name.is_empty() {
        return Err(validation("Brand name is required"));
    }

    let exists = brands::table
        .filter(brands::shop_id.eq(shop_id))
        .filter(brands::name.eq(name))
        .count()
        .get_result::<i64>(conn)?;
    if exists > 0 {
        return Err(conflict(format!("Brand {} already exists", name)));
    }

    let brand = Brand::new(shop_id.to_string(), name.to_string());
    diesel::insert_into(brands::table).values(&brand).execute(conn)?;

    info!("Created brand {}", brand.id);
    Ok(brand)
}

#[instrument(skip(pool))]
pub fn list_brands(pool: &DbPool, shop_id: &str) -> Result<Vec<Brand>> {
    let conn = &mut pool.get()?;
    Ok(brands::table
        .filter(brands::shop_id.eq(shop_id))
        .order(brands::name.asc())
        .load::<Brand>(conn)?)
}

/// Checks that the referenced category and brand exist in `shop_id`
fn check_classification(
    conn: &mut SqliteConnection,
    shop_id: &str,
    category_id: Option<&str>,
    brand_id: Option<&str>,
) -> Result<()> {
    if let Some(category_id) = category_id {
        let found = categories::table
            .filter(categories::id.eq(category_id))
            .filter(categories::shop_id.eq(shop_id))
            .count()
            .get_result::<i64>(conn)?;
        if found == 0 {
            return Err(validation(format!("Category {} does not belong to this shop", category_id)));
        }
    }
    if let Some(brand_id) = brand_id {
        let found = brands::table
            .filter(brands::id.eq(brand_id))
            .filter(brands::shop_id.eq(shop_id))
            .count()
            .get_result::<i64>(conn)?;
        if found == 0 {
            return Err(validation(format!("Brand {} does not belong to this shop", brand_id)));
        }
    }
    Ok(())
}

/// Creates a product and its inventory row in one transaction
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `shop_id` - The shop the product belongs to
/// * `dto` - The product details and opening stock
/// * `actor_id` - The user creating the product, for the audit log
///
/// ### Errors
///
/// Returns a `Conflict` if the SKU is already used in the shop, or a
/// `Validation` error if the category or brand belongs to another shop
#[instrument(skip(pool, dto), fields(sku = %dto.sku))]
pub fn create_product(pool: &DbPool, shop_id: &str, dto: &CreateProductDto, actor_id: &str) -> Result<Product> {
    debug!("Creating new product");
    dto.validate().map_err(|e| validation(e))?;
    let conn = &mut pool.get()?;

    let product = conn.transaction::<_, anyhow::Error, _>(|conn| {
        check_classification(conn, shop_id, dto.category_id.as_deref(), dto.brand_id.as_deref())?;

        let product = Product::new(NewProduct {
            shop_id: shop_id.to_string(),
            category_id: dto.category_id.clone(),
            brand_id: dto.brand_id.clone(),
            name: dto.name.trim().to_string(),
            sku: dto.sku.clone(),
            cost_price: dto.cost_price,
            sale_price: dto.sale_price,
            low_stock_threshold: dto.low_stock_threshold,
        });

        let taken = products::table
            .filter(products::shop_id.eq(shop_id))
            .filter(products::sku.eq(&product.sku))
            .count()
            .get_result::<i64>(conn)?;
        if taken > 0 {
            return Err(conflict(format!("SKU {} already exists in this shop", product.sku)));
        }

        diesel::insert_into(products::table).values(&product).execute(conn)?;

        let stock = InventoryItem::new(shop_id.to_string(), product.id.clone(), dto.initial_stock);
        diesel::insert_into(inventory_items::table).values(&stock).execute(conn)?;

        record_audit(
            conn,
            AuditLog::new(
                Some(shop_id),
                actor_id,
                "PRODUCT_CREATED",
                "product",
                &product.id,
                json!({"sku": product.sku, "initial_stock": dto.initial_stock}),
            ),
        )?;

        Ok(product)
    })?;

    info!("Successfully created product with id: {}", product.id);
    Ok(product)
}

/// Retrieves a product by ID, including inactive ones
#[instrument(skip(pool))]
pub fn get_product(pool: &DbPool, id: &str) -> Result<Option<Product>> {
    let conn = &mut pool.get()?;
    Ok(products::table.find(id).first::<Product>(conn).optional()?)
}

/// Escapes LIKE wildcards so a search term only matches itself
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lists a shop's active products, filtered by the query
#[instrument(skip(pool))]
pub fn list_products(pool: &DbPool, shop_id: &str, query: &ProductQuery) -> Result<Vec<Product>> {
    let conn = &mut pool.get()?;

    let mut q = products::table
        .filter(products::shop_id.eq(shop_id))
        .filter(products::active.eq(true))
        .order(products::name.asc())
        .into_boxed();

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        // SQLite LIKE is case-insensitive for ASCII
        let pattern = format!("%{}%", escape_like(search));
        q = q.filter(
            products::name
                .like(pattern.clone())
                .escape('\\')
                .or(products::sku.like(pattern).escape('\\')),
        );
    }
    if let Some(category_id) = &query.category_id {
        q = q.filter(products::category_id.eq(category_id));
    }
    if let Some(brand_id) = &query.brand_id {
        q = q.filter(products::brand_id.eq(brand_id));
    }

    let result = q.load::<Product>(conn)?;
    debug!("Retrieved {} products", result.len());
    Ok(result)
}

/// Applies a product patch on an existing connection
///
/// Shared by direct owner edits and approved worker requests.
pub fn apply_product_patch(conn: &mut SqliteConnection, product_id: &str, patch: &ProductPatch) -> Result<Product> {
    let product = products::table
        .find(product_id)
        .first::<Product>(conn)
        .optional()?
        .filter(|p| p.active)
        .ok_or_else(|| not_found("Product"))?;

    patch.validate().map_err(|e| validation(e))?;
    check_classification(conn, &product.shop_id, patch.category_id.as_deref(), patch.brand_id.as_deref())?;

    diesel::update(products::table.find(product_id))
        .set((patch, products::updated_at.eq(Utc::now().naive_utc())))
        .execute(conn)?;

    Ok(products::table.find(product_id).first::<Product>(conn)?)
}

/// Soft-deletes a product on an existing connection
pub fn deactivate_product_conn(conn: &mut SqliteConnection, product_id: &str) -> Result<()> {
    let updated = diesel::update(products::table.find(product_id).filter(products::active.eq(true)))
        .set((products::active.eq(false), products::updated_at.eq(Utc::now().naive_utc())))
        .execute(conn)?;
    if updated == 0 {
        return Err(not_found("Product"));
    }
    Ok(())
}

/// Updates a product directly and records the change
#[instrument(skip(pool, patch))]
pub fn update_product(pool: &DbPool, product_id: &str, patch: &ProductPatch, actor_id: &str) -> Result<Product> {
    let conn = &mut pool.get()?;

    let product = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let product = apply_product_patch(conn, product_id, patch)?;
        record_audit(
            conn,
            AuditLog::new(
                Some(&product.shop_id),
                actor_id,
                "PRODUCT_UPDATED",
                "product",
                product_id,
                serde_json::to_value(patch)?,
            ),
        )?;
        Ok(product)
    })?;

    info!("Updated product {}", product_id);
    Ok(product)
}

/// Soft-deletes a product and records the change
#[instrument(skip(pool))]
pub fn deactivate_product(pool: &DbPool, product_id: &str, actor_id: &str) -> Result<()> {
    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        let shop_id = products::table
            .find(product_id)
            .select(products::shop_id)
            .first::<String>(conn)
            .optional()?
            .ok_or_else(|| not_found("Product"))?;
        deactivate_product_conn(conn, product_id)?;
        record_audit(
            conn,
            AuditLog::new(Some(&shop_id), actor_id, "PRODUCT_DELETED", "product", product_id, json!({})),
        )?;
        Ok(())
    })?;

    info!("Deactivated product {}", product_id);
    Ok(())
}
