use crate::db::DbPool;
use crate::dto::CreatePurchaseDto;
use crate::models::{AuditLog, PaymentStatus, Purchase, PurchaseDetail, PurchaseItem, PurchasePayment};
use crate::schema::{products, purchase_items, purchase_payments, purchases};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{change_stock, not_found, record_audit, validation};

fn insert_payment(conn: &mut SqliteConnection, purchase: &Purchase, payment: &PurchasePayment) -> Result<Purchase> {
    let (paid, status) = purchase.apply_payment(payment.amount).map_err(|e| validation(e))?;
    let now = Utc::now().naive_utc();

    // Guarded on the old paid amount so two concurrent payments cannot both apply
    let updated = diesel::update(
        purchases::table
            .find(&purchase.id)
            .filter(purchases::paid_amount.eq(purchase.paid_amount)),
    )
    .set((
        purchases::paid_amount.eq(paid),
        purchases::payment_status.eq(status),
        purchases::updated_at.eq(now),
    ))
    .execute(conn)?;
    if updated == 0 {
        return Err(validation("Purchase was modified concurrently, please retry"));
    }

    diesel::insert_into(purchase_payments::table).values(payment).execute(conn)?;

    Ok(Purchase {
        paid_amount: paid,
        payment_status: status,
        updated_at: now,
        ..purchase.clone()
    })
}

/// Records stock bought from a supplier
///
/// In one transaction this adds every line to inventory, writes the purchase
/// with its lines, records any up-front payment, and audits the purchase.
///
/// ### Errors
///
/// Returns a `Validation` error if a product is not an active product of the
/// shop, the total is too large, or the up-front payment exceeds the total
#[instrument(skip(pool, dto), fields(supplier = %dto.supplier_name))]
pub fn create_purchase(pool: &DbPool, shop_id: &str, dto: &CreatePurchaseDto, actor_id: &str) -> Result<PurchaseDetail> {
    debug!("Creating new purchase");
    dto.validate().map_err(|e| validation(e))?;
    let total_cost = dto
        .total_cost()
        .ok_or_else(|| validation("Purchase total is too large"))?;
    if dto.paid_amount > total_cost {
        return Err(validation(format!(
            "Paid amount of {} exceeds the purchase total of {}",
            dto.paid_amount, total_cost
        )));
    }

    let conn = &mut pool.get()?;
    let detail = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let mut purchase = Purchase::new(
            shop_id.to_string(),
            dto.supplier_name.trim().to_string(),
            dto.reference.clone(),
            total_cost,
            actor_id.to_string(),
        );

        let mut items = Vec::with_capacity(dto.items.len());
        for line in &dto.items {
            let in_shop = products::table
                .find(&line.product_id)
                .filter(products::shop_id.eq(shop_id))
                .filter(products::active.eq(true))
                .count()
                .get_result::<i64>(conn)?;
            if in_shop == 0 {
                return Err(validation(format!("Product {} is not available in this shop", line.product_id)));
            }

            change_stock(conn, &line.product_id, line.quantity)?;
            let item = PurchaseItem::new(purchase.id.clone(), line.product_id.clone(), line.quantity, line.unit_cost)
                .map_err(|e| validation(e))?;
            items.push(item);
        }

        diesel::insert_into(purchases::table).values(&purchase).execute(conn)?;
        diesel::insert_into(purchase_items::table).values(&items).execute(conn)?;

        let mut payments = Vec::new();
        if dto.paid_amount > 0 {
            let payment = PurchasePayment::new(
                purchase.id.clone(),
                dto.paid_amount,
                Some("Paid on purchase".to_string()),
                actor_id.to_string(),
            );
            purchase = insert_payment(conn, &purchase, &payment)?;
            payments.push(payment);
        }

        record_audit(
            conn,
            AuditLog::new(
                Some(shop_id),
                actor_id,
                "PURCHASE_CREATED",
                "purchase",
                &purchase.id,
                json!({"supplier": purchase.supplier_name, "total_cost": total_cost, "paid": purchase.paid_amount}),
            ),
        )?;

        Ok(PurchaseDetail { purchase, items, payments })
    })?;

    info!("Created purchase {}", detail.purchase.id);
    Ok(detail)
}

/// Lists a shop's purchases, newest first, optionally by payment status
#[instrument(skip(pool))]
pub fn list_purchases(pool: &DbPool, shop_id: &str, status: Option<PaymentStatus>) -> Result<Vec<Purchase>> {
    let conn = &mut pool.get()?;

    let mut query = purchases::table
        .filter(purchases::shop_id.eq(shop_id))
        .order(purchases::created_at.desc())
        .into_boxed();
    if let Some(status) = status {
        query = query.filter(purchases::payment_status.eq(status));
    }

    let result = query.load::<Purchase>(conn)?;
    debug!("Retrieved {} purchases", result.len());
    Ok(result)
}

/// Retrieves a purchase without its lines
#[instrument(skip(pool))]
pub fn get_purchase(pool: &DbPool, id: &str) -> Result<Option<Purchase>> {
    let conn = &mut pool.get()?;
    Ok(purchases::table.find(id).first::<Purchase>(conn).optional()?)
}

/// Retrieves a purchase with its lines and payments
#[instrument(skip(pool))]
pub fn get_purchase_detail(pool: &DbPool, id: &str) -> Result<PurchaseDetail> {
    let conn = &mut pool.get()?;

    let purchase = purchases::table
        .find(id)
        .first::<Purchase>(conn)
        .optional()?
        .ok_or_else(|| not_found("Purchase"))?;
    let items = purchase_items::table
        .filter(purchase_items::purchase_id.eq(id))
        .load::<PurchaseItem>(conn)?;
    let payments = purchase_payments::table
        .filter(purchase_payments::purchase_id.eq(id))
        .order(purchase_payments::created_at.asc())
        .load::<PurchasePayment>(conn)?;

    Ok(PurchaseDetail { purchase, items, payments })
}

/// Records a payment to the supplier against a purchase
///
/// ### Errors
///
/// Returns a `NotFound` if the purchase does not exist, or a `Validation`
/// error if the amount is not positive, the purchase is already paid, or the
/// payment would exceed the outstanding balance. The purchase is unchanged
/// on error.
#[instrument(skip(pool, note))]
pub fn record_payment(
    pool: &DbPool,
    purchase_id: &str,
    amount: i64,
    note: Option<String>,
    actor_id: &str,
) -> Result<Purchase> {
    let conn = &mut pool.get()?;

    let purchase = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let purchase = purchases::table
            .find(purchase_id)
            .first::<Purchase>(conn)
            .optional()?
            .ok_or_else(|| not_found("Purchase"))?;

        let payment = PurchasePayment::new(purchase.id.clone(), amount, note, actor_id.to_string());
        let updated = insert_payment(conn, &purchase, &payment)?;

        record_audit(
            conn,
            AuditLog::new(
                Some(&purchase.shop_id),
                actor_id,
                "PURCHASE_PAYMENT",
                "purchase",
                &purchase.id,
                json!({"amount": amount, "paid_amount": updated.paid_amount, "status": updated.payment_status}),
            ),
        )?;

        Ok(updated)
    })?;

    info!("Recorded payment on purchase {}: now {}", purchase_id, purchase.payment_status);
    Ok(purchase)
}

#[cfg(test)]
mod tests;
