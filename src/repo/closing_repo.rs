use crate::db::DbPool;
use crate::models::{AuditLog, ClosingInput, DailyClosing, PaymentMethod, SalesBreakdown};
use crate::schema::{daily_closings, sales};
use anyhow::Result;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{conflict, day_bounds, record_audit, validation};

/// Totals a shop's sales for one day by how they were paid
pub fn sales_breakdown(conn: &mut SqliteConnection, shop_id: &str, date: NaiveDate) -> Result<SalesBreakdown> {
    let (start, end) = day_bounds(date);
    let rows = sales::table
        .filter(sales::shop_id.eq(shop_id))
        .filter(sales::created_at.ge(start))
        .filter(sales::created_at.lt(end))
        .select((sales::payment_method, sales::total))
        .load::<(PaymentMethod, i64)>(conn)?;

    let mut breakdown = SalesBreakdown::default();
    for (method, total) in rows {
        breakdown.add(method, total).map_err(|e| validation(e))?;
    }
    Ok(breakdown)
}

/// Closes the day for a shop
///
/// Sales for the day are read and the closing is written in one transaction,
/// so a sale rung up concurrently lands either before or after the closing.
///
/// ### Errors
///
/// Returns a `Conflict` if the shop has already closed that day
#[instrument(skip(pool, input), fields(date = %input.closing_date))]
pub fn create_daily_closing(pool: &DbPool, shop_id: &str, closed_by: &str, input: ClosingInput) -> Result<DailyClosing> {
    let conn = &mut pool.get()?;

    let closing = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let exists = daily_closings::table
            .filter(daily_closings::shop_id.eq(shop_id))
            .filter(daily_closings::closing_date.eq(input.closing_date))
            .count()
            .get_result::<i64>(conn)?;
        if exists > 0 {
            return Err(conflict(format!("Day {} has already been closed", input.closing_date)));
        }

        let breakdown = sales_breakdown(conn, shop_id, input.closing_date)?;
        debug!(?breakdown, "Totalled sales for closing");

        let closing = DailyClosing::compute(shop_id.to_string(), closed_by.to_string(), input, breakdown)
            .map_err(|e| validation(e))?;
        diesel::insert_into(daily_closings::table).values(&closing).execute(conn)?;

        record_audit(
            conn,
            AuditLog::new(
                Some(shop_id),
                closed_by,
                "DAY_CLOSED",
                "daily_closing",
                &closing.id,
                json!({
                    "closing_date": closing.closing_date,
                    "expected_cash": closing.expected_cash,
                    "actual_cash": closing.actual_cash,
                    "difference": closing.difference,
                }),
            ),
        )?;
        Ok(closing)
    })?;

    info!("Closed {} for shop {} with difference {}", closing.closing_date, shop_id, closing.difference);
    Ok(closing)
}

/// Lists a shop's closings, newest date first
#[instrument(skip(pool))]
pub fn list_daily_closings(pool: &DbPool, shop_id: &str) -> Result<Vec<DailyClosing>> {
    let conn = &mut pool.get()?;
    Ok(daily_closings::table
        .filter(daily_closings::shop_id.eq(shop_id))
        .order(daily_closings::closing_date.desc())
        .load::<DailyClosing>(conn)?)
}
