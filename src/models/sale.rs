use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PaymentMethod;

const INVOICE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const INVOICE_SUFFIX_LEN: usize = 6;

/// A completed point-of-sale transaction
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::sales)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Sale {
    pub id: String,
    pub shop_id: String,
    pub invoice_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub created_by: String,
    pub created_at: NaiveDateTime,
}

/// One line of a sale
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::sale_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

impl SaleItem {
    /// Prices a line, failing if the total does not fit in an `i64` of paisa
    pub fn new(sale_id: String, product_id: String, quantity: i32, unit_price: i64) -> Result<Self, String> {
        let line_total = unit_price
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| format!("Line total for product {} is too large", product_id))?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            sale_id,
            product_id,
            quantity,
            unit_price,
            line_total,
        })
    }
}

/// A sale together with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Builds an invoice number of the form `INV-YYYYMMDD-XXXXXX`
///
/// The suffix avoids look-alike characters (0/O, 1/I) since invoice numbers
/// get read out over the counter.
pub fn generate_invoice_number(date: NaiveDate) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..INVOICE_SUFFIX_LEN)
        .map(|_| INVOICE_ALPHABET[rng.random_range(0..INVOICE_ALPHABET.len())] as char)
        .collect();
    format!("INV-{}-{}", date.format("%Y%m%d"), suffix)
}

impl Sale {
    /// Starts a sale record; totals are filled in by the caller once lines are priced
    pub fn new(
        shop_id: String,
        payment_method: PaymentMethod,
        customer_name: Option<String>,
        customer_phone: Option<String>,
        created_by: String,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            invoice_number: generate_invoice_number(now.date()),
            customer_name,
            customer_phone,
            payment_method,
            subtotal: 0,
            discount: 0,
            total: 0,
            created_by,
            created_at: now,
        }
    }
}
