use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock on hand for one product
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::inventory_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InventoryItem {
    pub id: String,
    pub shop_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub updated_at: NaiveDateTime,
}

impl InventoryItem {
    pub fn new(shop_id: String, product_id: String, quantity: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            product_id,
            quantity,
            updated_at: Utc::now().naive_utc(),
        }
    }

    pub fn is_low(&self, threshold: i32) -> bool {
        self.quantity <= threshold
    }
}

/// An inventory row joined with the product fields shown in stock lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub low_stock_threshold: i32,
    pub is_low: bool,
    pub updated_at: NaiveDateTime,
}

/// A signed stock correction
///
/// Also the payload of an `INVENTORY_ADJUSTMENT` approval request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockAdjustment {
    pub delta: i32,
    pub reason: String,
}

impl StockAdjustment {
    pub fn validate(&self) -> Result<(), String> {
        if self.delta == 0 {
            return Err("Adjustment delta cannot be zero".to_string());
        }
        if self.delta == i32::MIN {
            return Err("Adjustment delta is out of range".to_string());
        }
        if self.reason.trim().is_empty() {
            return Err("Adjustment reason is required".to_string());
        }
        Ok(())
    }
}
