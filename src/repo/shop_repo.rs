use crate::db::DbPool;
use crate::dto::UpdateShopDto;
use crate::models::{
    ApprovalStatus, InventoryItem, PaymentStatus, Product, Role, Shop, ShopStats, User,
};
use crate::schema::{approval_requests, inventory_items, products, purchases, sales, shop_workers, shops, users};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use super::{day_bounds, not_found, validation};

/// Creates a shop owned by `owner_id`
///
/// ### Errors
///
/// Returns a `Validation` error if the owner does not exist or is not an
/// active OWNER account
#[instrument(skip(pool), fields(owner_id = %owner_id))]
pub fn create_shop(pool: &DbPool, name: String, address: String, phone: String, owner_id: &str) -> Result<Shop> {
    debug!("Creating new shop");
    let conn = &mut pool.get()?;

    let owner = users::table.find(owner_id).first::<User>(conn).optional()?;
    match owner {
        Some(owner) if owner.role == Role::Owner && owner.active => {}
        Some(_) => return Err(validation("Shop owner must be an active OWNER account")),
        None => return Err(validation(format!("Owner {} does not exist", owner_id))),
    }

    let shop = Shop::new(name, address, phone, owner_id.to_string());
    diesel::insert_into(shops::table).values(&shop).execute(conn)?;

    info!("Successfully created shop with id: {}", shop.id);
    Ok(shop)
}

/// Retrieves a shop by ID
#[instrument(skip(pool))]
pub fn get_shop(pool: &DbPool, id: &str) -> Result<Option<Shop>> {
    let conn = &mut pool.get()?;
    let shop = shops::table.find(id).first::<Shop>(conn).optional()?;
    Ok(shop)
}

/// Lists the shops a user can see
///
/// Super admins see every shop, owners see the shops they own, and workers
/// see the shops they are actively linked to.
#[instrument(skip(pool, user), fields(user_id = %user.id))]
pub fn list_shops_for_user(pool: &DbPool, user: &User) -> Result<Vec<Shop>> {
    let conn = &mut pool.get()?;

    let result = match user.role {
        Role::SuperAdmin => shops::table.order(shops::name.asc()).load::<Shop>(conn)?,
        Role::Owner => shops::table
            .filter(shops::owner_id.eq(&user.id))
            .order(shops::name.asc())
            .load::<Shop>(conn)?,
        Role::Worker => shops::table
            .inner_join(shop_workers::table)
            .filter(shop_workers::user_id.eq(&user.id))
            .filter(shop_workers::active.eq(true))
            .select(Shop::as_select())
            .order(shops::name.asc())
            .load::<Shop>(conn)?,
    };

    debug!("Retrieved {} shops", result.len());
    Ok(result)
}

/// Applies a partial update to a shop
///
/// ### Errors
///
/// Returns a `NotFound` if the shop does not exist, or a `Validation` error
/// if a provided text field is blank
#[instrument(skip(pool, update))]
pub fn update_shop(pool: &DbPool, id: &str, update: &UpdateShopDto) -> Result<Shop> {
    let conn = &mut pool.get()?;

    let mut shop = shops::table.find(id).first::<Shop>(conn).optional()?.ok_or_else(|| not_found("Shop"))?;

    for (field, value) in [("name", &update.name), ("address", &update.address), ("phone", &update.phone)] {
        if value.as_ref().is_some_and(|v| v.trim().is_empty()) {
            return Err(validation(format!("Shop {} cannot be empty", field)));
        }
    }

    if let Some(name) = &update.name {
        shop.name = name.trim().to_string();
    }
    if let Some(address) = &update.address {
        shop.address = address.trim().to_string();
    }
    if let Some(phone) = &update.phone {
        shop.phone = phone.trim().to_string();
    }
    if let Some(active) = update.active {
        shop.active = active;
    }
    shop.updated_at = Utc::now().naive_utc();

    diesel::update(shops::table.find(id))
        .set((
            shops::name.eq(&shop.name),
            shops::address.eq(&shop.address),
            shops::phone.eq(&shop.phone),
            shops::active.eq(shop.active),
            shops::updated_at.eq(shop.updated_at),
        ))
        .execute(conn)?;

    info!("Updated shop {}", id);
    Ok(shop)
}

/// Computes dashboard figures for a shop on the given day
///
/// Only active products count towards stock and inventory value.
#[instrument(skip(pool))]
pub fn shop_stats(pool: &DbPool, shop_id: &str, date: NaiveDate) -> Result<ShopStats> {
    let conn = &mut pool.get()?;
    let mut stats = ShopStats::default();

    let stock = inventory_items::table
        .inner_join(products::table)
        .filter(products::shop_id.eq(shop_id))
        .filter(products::active.eq(true))
        .select((InventoryItem::as_select(), Product::as_select()))
        .load::<(InventoryItem, Product)>(conn)?;

    stats.product_count = products::table
        .filter(products::shop_id.eq(shop_id))
        .filter(products::active.eq(true))
        .count()
        .get_result(conn)?;
    // Reporting only, so totals saturate rather than fail the whole request
    for (item, product) in &stock {
        let units = i64::from(item.quantity);
        stats.total_stock_units = stats.total_stock_units.saturating_add(units);
        stats.inventory_value = stats
            .inventory_value
            .saturating_add(units.saturating_mul(product.cost_price));
        if item.is_low(product.low_stock_threshold) {
            stats.low_stock_count += 1;
        }
    }

    let (start, end) = day_bounds(date);
    let totals = sales::table
        .filter(sales::shop_id.eq(shop_id))
        .filter(sales::created_at.ge(start))
        .filter(sales::created_at.lt(end))
        .select(sales::total)
        .load::<i64>(conn)?;
    stats.sales_today_count = totals.len() as i64;
    stats.sales_today_total = totals.iter().fold(0i64, |acc, t| acc.saturating_add(*t));

    let open_purchases = purchases::table
        .filter(purchases::shop_id.eq(shop_id))
        .filter(purchases::payment_status.ne(PaymentStatus::Paid))
        .select((purchases::total_cost, purchases::paid_amount))
        .load::<(i64, i64)>(conn)?;
    stats.purchases_outstanding = open_purchases
        .iter()
        .fold(0i64, |acc, (total, paid)| acc.saturating_add(total - paid));

    stats.pending_approvals = approval_requests::table
        .filter(approval_requests::shop_id.eq(shop_id))
        .filter(approval_requests::status.eq(ApprovalStatus::Pending))
        .count()
        .get_result(conn)?;

    stats.worker_count = shop_workers::table
        .filter(shop_workers::shop_id.eq(shop_id))
        .filter(shop_workers::active.eq(true))
        .count()
        .get_result(conn)?;

    debug!("Computed stats for shop {}: {:?}", shop_id, stats);
    Ok(stats)
}
