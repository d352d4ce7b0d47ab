use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PaymentMethod;

/// End-of-day cash reconciliation for a shop
///
/// All amounts are in paisa.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::daily_closings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DailyClosing {
    pub id: String,
    pub shop_id: String,
    pub closing_date: NaiveDate,
    pub opening_cash: i64,
    pub cash_sales: i64,
    pub card_sales: i64,
    pub other_sales: i64,
    pub expenses: i64,
    pub expected_cash: i64,
    pub actual_cash: i64,
    /// Positive when the drawer holds more than expected
    pub difference: i64,
    pub notes: Option<String>,
    pub closed_by: String,
    pub created_at: NaiveDateTime,
}

/// Sales for one day, bucketed the way the drawer is counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalesBreakdown {
    pub cash: i64,
    pub card: i64,
    pub other: i64,
}

impl SalesBreakdown {
    pub fn add(&mut self, method: PaymentMethod, amount: i64) -> Result<(), String> {
        let bucket = match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Card => &mut self.card,
            PaymentMethod::BankTransfer | PaymentMethod::Easypaisa | PaymentMethod::JazzCash => &mut self.other,
        };
        *bucket = bucket
            .checked_add(amount)
            .ok_or_else(|| format!("{} sales for the day are too large to total", method))?;
        Ok(())
    }
}

/// The figures counted by whoever closes the shop
#[derive(Debug, Clone)]
pub struct ClosingInput {
    pub closing_date: NaiveDate,
    pub opening_cash: i64,
    pub expenses: i64,
    pub actual_cash: i64,
    pub notes: Option<String>,
}

impl DailyClosing {
    /// Computes a closing from the counted figures and the day's sales
    ///
    /// ### Errors
    ///
    /// Returns a message if expected cash or the difference does not fit in
    /// an `i64` of paisa.
    pub fn compute(
        shop_id: String,
        closed_by: String,
        input: ClosingInput,
        sales: SalesBreakdown,
    ) -> Result<Self, String> {
        let out_of_range = || "Closing figures are too large".to_string();
        let expected_cash = input
            .opening_cash
            .checked_add(sales.cash)
            .and_then(|cash| cash.checked_sub(input.expenses))
            .ok_or_else(out_of_range)?;
        let difference = input.actual_cash.checked_sub(expected_cash).ok_or_else(out_of_range)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            closing_date: input.closing_date,
            opening_cash: input.opening_cash,
            cash_sales: sales.cash,
            card_sales: sales.card,
            other_sales: sales.other,
            expenses: input.expenses,
            expected_cash,
            actual_cash: input.actual_cash,
            difference,
            notes: input.notes,
            closed_by,
            created_at: Utc::now().naive_utc(),
        })
    }
}
