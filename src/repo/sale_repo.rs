use crate::db::DbPool;
use crate::dto::CreateSaleDto;
use crate::models::{AuditLog, Product, Sale, SaleItem, SaleWithItems};
use crate::schema::{products, sale_items, sales};
use anyhow::Result;
use chrono::NaiveDate;
use diesel::prelude::*;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{change_stock, day_bounds, not_found, record_audit, validation};

/// Rings up a sale
///
/// In one transaction this checks every line against the shop's active
/// products, takes the stock, writes the sale with its lines, and records
/// an audit entry. Nothing is written if any line fails.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `shop_id` - The shop making the sale
/// * `dto` - The cart, discount, and payment details
/// * `actor_id` - The user at the till
///
/// ### Errors
///
/// Returns a `Validation` error if a product is missing from the shop or
/// inactive, stock is insufficient, or the discount exceeds the subtotal
#[instrument(skip(pool, dto), fields(lines = dto.items.len()))]
pub fn create_sale(pool: &DbPool, shop_id: &str, dto: &CreateSaleDto, actor_id: &str) -> Result<SaleWithItems> {
    debug!("Creating new sale");
    dto.validate().map_err(|e| validation(e))?;
    let conn = &mut pool.get()?;

    let result = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let mut sale = Sale::new(
            shop_id.to_string(),
            dto.payment_method,
            dto.customer_name.clone(),
            dto.customer_phone.clone(),
            actor_id.to_string(),
        );

        let mut items = Vec::with_capacity(dto.items.len());
        for line in &dto.items {
            let product = products::table
                .find(&line.product_id)
                .filter(products::shop_id.eq(shop_id))
                .filter(products::active.eq(true))
                .first::<Product>(conn)
                .optional()?
                .ok_or_else(|| validation(format!("Product {} is not available in this shop", line.product_id)))?;

            change_stock(conn, &product.id, -line.quantity)?;

            let unit_price = line.unit_price.unwrap_or(product.sale_price);
            items.push(SaleItem::new(sale.id.clone(), product.id, line.quantity, unit_price).map_err(|e| validation(e))?);
        }

        sale.subtotal = items
            .iter()
            .try_fold(0i64, |acc, i| acc.checked_add(i.line_total))
            .ok_or_else(|| validation("Sale subtotal is too large"))?;
        if dto.discount > sale.subtotal {
            return Err(validation(format!(
                "Discount of {} exceeds the subtotal of {}",
                dto.discount, sale.subtotal
            )));
        }
        sale.discount = dto.discount;
        sale.total = sale.subtotal - sale.discount;

        diesel::insert_into(sales::table).values(&sale).execute(conn)?;
        diesel::insert_into(sale_items::table).values(&items).execute(conn)?;

        record_audit(
            conn,
            AuditLog::new(
                Some(shop_id),
                actor_id,
                "SALE_CREATED",
                "sale",
                &sale.id,
                json!({"invoice_number": sale.invoice_number, "total": sale.total}),
            ),
        )?;

        Ok(SaleWithItems { sale, items })
    })?;

    info!("Created sale {} ({})", result.sale.id, result.sale.invoice_number);
    Ok(result)
}

/// Lists a shop's sales, newest first, optionally for a single day
#[instrument(skip(pool))]
pub fn list_sales(pool: &DbPool, shop_id: &str, date: Option<NaiveDate>) -> Result<Vec<Sale>> {
    let conn = &mut pool.get()?;

    let mut query = sales::table
        .filter(sales::shop_id.eq(shop_id))
        .order(sales::created_at.desc())
        .into_boxed();
    if let Some(date) = date {
        let (start, end) = day_bounds(date);
        query = query.filter(sales::created_at.ge(start)).filter(sales::created_at.lt(end));
    }

    let result = query.load::<Sale>(conn)?;
    debug!("Retrieved {} sales", result.len());
    Ok(result)
}

/// Retrieves a sale with its lines
#[instrument(skip(pool))]
pub fn get_sale(pool: &DbPool, id: &str) -> Result<SaleWithItems> {
    let conn = &mut pool.get()?;

    let sale = sales::table.find(id).first::<Sale>(conn).optional()?.ok_or_else(|| not_found("Sale"))?;
    let items = sale_items::table
        .filter(sale_items::sale_id.eq(&sale.id))
        .load::<SaleItem>(conn)?;

    Ok(SaleWithItems { sale, items })
}
