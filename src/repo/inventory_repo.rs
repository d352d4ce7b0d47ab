use crate::db::DbPool;
use crate::models::{AuditLog, InventoryItem, InventoryView, Product, StockAdjustment};
use crate::schema::{inventory_items, products};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::{not_found, record_audit, validation};

fn to_view(item: InventoryItem, product: Product) -> InventoryView {
    InventoryView {
        is_low: item.is_low(product.low_stock_threshold),
        id: item.id,
        product_id: product.id,
        product_name: product.name,
        sku: product.sku,
        quantity: item.quantity,
        low_stock_threshold: product.low_stock_threshold,
        updated_at: item.updated_at,
    }
}

/// Lists stock for a shop's active products, ordered by product name
#[instrument(skip(pool))]
pub fn list_inventory(pool: &DbPool, shop_id: &str) -> Result<Vec<InventoryView>> {
    let conn = &mut pool.get()?;

    let rows = inventory_items::table
        .inner_join(products::table)
        .filter(inventory_items::shop_id.eq(shop_id))
        .filter(products::active.eq(true))
        .order(products::name.asc())
        .select((InventoryItem::as_select(), Product::as_select()))
        .load::<(InventoryItem, Product)>(conn)?;

    debug!("Retrieved {} inventory rows", rows.len());
    Ok(rows.into_iter().map(|(item, product)| to_view(item, product)).collect())
}

/// Lists stock rows at or below their product's low-stock threshold
#[instrument(skip(pool))]
pub fn list_low_stock(pool: &DbPool, shop_id: &str) -> Result<Vec<InventoryView>> {
    let rows = list_inventory(pool, shop_id)?;
    Ok(rows.into_iter().filter(|row| row.is_low).collect())
}

/// Retrieves an inventory row by ID
#[instrument(skip(pool))]
pub fn get_inventory_item(pool: &DbPool, id: &str) -> Result<Option<InventoryItem>> {
    let conn = &mut pool.get()?;
    Ok(inventory_items::table.find(id).first::<InventoryItem>(conn).optional()?)
}

/// Retrieves the inventory row for a product
pub fn get_inventory_for_product(pool: &DbPool, product_id: &str) -> Result<Option<InventoryItem>> {
    let conn = &mut pool.get()?;
    Ok(inventory_items::table
        .filter(inventory_items::product_id.eq(product_id))
        .first::<InventoryItem>(conn)
        .optional()?)
}

/// Adds `delta` to a product's stock on an existing connection
///
/// The update is guarded on the current quantity so stock can never go below
/// zero, even if another writer got in first.
///
/// ### Errors
///
/// Returns a `Validation` error naming the SKU if there is not enough stock
/// or the new quantity would not fit
pub fn change_stock(conn: &mut SqliteConnection, product_id: &str, delta: i32) -> Result<InventoryItem> {
    let (item, product) = inventory_items::table
        .inner_join(products::table)
        .filter(inventory_items::product_id.eq(product_id))
        .select((InventoryItem::as_select(), Product::as_select()))
        .first::<(InventoryItem, Product)>(conn)
        .optional()?
        .ok_or_else(|| not_found("Inventory for product"))?;

    let Some(new_quantity) = item.quantity.checked_add(delta) else {
        return Err(validation(format!("Stock change of {} for {} is out of range", delta, product.sku)));
    };
    if new_quantity < 0 {
        return Err(validation(format!(
            "Insufficient stock for {}: {} available, {} requested",
            product.sku,
            item.quantity,
            delta.unsigned_abs()
        )));
    }

    // Bounds hold against the stored row too, in case another writer got in first
    let updated = diesel::update(
        inventory_items::table
            .find(&item.id)
            .filter(inventory_items::quantity.ge(delta.min(0).saturating_neg()))
            .filter(inventory_items::quantity.le(i32::MAX - delta.max(0))),
    )
    .set((
        inventory_items::quantity.eq(inventory_items::quantity + delta),
        inventory_items::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(conn)?;
    if updated == 0 {
        warn!("Stock for {} changed during update", product.sku);
        return Err(validation(format!("Insufficient stock for {}", product.sku)));
    }

    Ok(inventory_items::table.find(&item.id).first::<InventoryItem>(conn)?)
}

/// Applies a stock adjustment to an inventory row on an existing connection
///
/// Shared by direct owner adjustments and approved worker requests.
pub fn apply_adjustment(
    conn: &mut SqliteConnection,
    inventory_id: &str,
    adjustment: &StockAdjustment,
    actor_id: &str,
) -> Result<InventoryItem> {
    adjustment.validate().map_err(|e| validation(e))?;

    let item = inventory_items::table
        .find(inventory_id)
        .first::<InventoryItem>(conn)
        .optional()?
        .ok_or_else(|| not_found("Inventory item"))?;

    let updated = change_stock(conn, &item.product_id, adjustment.delta)?;

    record_audit(
        conn,
        AuditLog::new(
            Some(&item.shop_id),
            actor_id,
            "INVENTORY_ADJUSTED",
            "inventory_item",
            inventory_id,
            json!({
                "delta": adjustment.delta,
                "reason": adjustment.reason,
                "before": item.quantity,
                "after": updated.quantity,
            }),
        ),
    )?;

    Ok(updated)
}

/// Adjusts stock directly and records the change
#[instrument(skip(pool, adjustment), fields(delta = adjustment.delta))]
pub fn adjust_inventory(
    pool: &DbPool,
    inventory_id: &str,
    adjustment: &StockAdjustment,
    actor_id: &str,
) -> Result<InventoryItem> {
    let conn = &mut pool.get()?;
    let item = conn.transaction::<_, anyhow::Error, _>(|conn| apply_adjustment(conn, inventory_id, adjustment, actor_id))?;

    info!("Adjusted inventory {} to {}", inventory_id, item.quantity);
    Ok(item)
}

/// Creates zero-stock inventory rows for products that lack one
///
/// ### Returns
///
/// The number of rows created
#[instrument(skip(pool))]
pub fn reconcile_missing_inventory(pool: &DbPool) -> Result<usize> {
    let conn = &mut pool.get()?;

    let created = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let missing = products::table
            .left_join(inventory_items::table)
            .filter(inventory_items::id.is_null())
            .select((products::id, products::shop_id))
            .load::<(String, String)>(conn)?;

        for (product_id, shop_id) in &missing {
            let stock = InventoryItem::new(shop_id.clone(), product_id.clone(), 0);
            diesel::insert_into(inventory_items::table).values(&stock).execute(conn)?;
        }
        Ok(missing.len())
    })?;

    info!("Created {} missing inventory rows", created);
    Ok(created)
}
