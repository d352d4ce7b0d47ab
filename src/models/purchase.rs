use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PaymentStatus;

/// Stock bought from a supplier, possibly on credit
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::purchases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Purchase {
    pub id: String,
    pub shop_id: String,
    pub supplier_name: String,
    pub reference: Option<String>,
    pub total_cost: i64,
    pub paid_amount: i64,
    pub payment_status: PaymentStatus,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Purchase {
    pub fn new(
        shop_id: String,
        supplier_name: String,
        reference: Option<String>,
        total_cost: i64,
        created_by: String,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            supplier_name,
            reference,
            total_cost,
            paid_amount: 0,
            payment_status: PaymentStatus::Unpaid,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn outstanding(&self) -> i64 {
        self.total_cost - self.paid_amount
    }

    /// Applies a supplier payment, returning the new paid amount and status
    ///
    /// ### Errors
    ///
    /// Returns a message if the amount is not positive, the purchase is
    /// already settled, or the payment would exceed the total.
    pub fn apply_payment(&self, amount: i64) -> Result<(i64, PaymentStatus), String> {
        if amount <= 0 {
            return Err("Payment amount must be greater than zero".to_string());
        }
        if self.payment_status == PaymentStatus::Paid {
            return Err("Purchase is already fully paid".to_string());
        }
        let paid = self.paid_amount.checked_add(amount).filter(|paid| *paid <= self.total_cost);
        let Some(paid) = paid else {
            return Err(format!(
                "Payment of {} exceeds the outstanding balance of {}",
                amount,
                self.outstanding()
            ));
        };
        Ok((paid, PaymentStatus::from_amounts(paid, self.total_cost)))
    }
}

/// One line of a purchase
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::purchase_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub unit_cost: i64,
    pub line_total: i64,
}

impl PurchaseItem {
    /// Prices a line, failing if the total does not fit in an `i64` of paisa
    pub fn new(purchase_id: String, product_id: String, quantity: i32, unit_cost: i64) -> Result<Self, String> {
        let line_total = unit_cost
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| format!("Line total for product {} is too large", product_id))?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            purchase_id,
            product_id,
            quantity,
            unit_cost,
            line_total,
        })
    }
}

/// A payment made to a supplier against a purchase
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::purchase_payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PurchasePayment {
    pub id: String,
    pub purchase_id: String,
    pub amount: i64,
    pub note: Option<String>,
    pub recorded_by: String,
    pub created_at: NaiveDateTime,
}

impl PurchasePayment {
    pub fn new(purchase_id: String, amount: i64, note: Option<String>, recorded_by: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            purchase_id,
            amount,
            note,
            recorded_by,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// A purchase with its lines and payment history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
    pub payments: Vec<PurchasePayment>,
}
