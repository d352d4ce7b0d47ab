use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product category within a shop, e.g. "Smartphones" or "Chargers"
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Category {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl Category {
    pub fn new(shop_id: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            name,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// A manufacturer brand within a shop
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::brands)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Brand {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl Brand {
    pub fn new(shop_id: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            name,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// A sellable product in a shop's catalog
///
/// Prices are in paisa. Stock lives in the matching `InventoryItem`.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Product {
    pub id: String,
    pub shop_id: String,
    pub category_id: Option<String>,
    pub brand_id: Option<String>,
    pub name: String,
    pub sku: String,
    pub cost_price: i64,
    pub sale_price: i64,
    pub low_stock_threshold: i32,
    /// Soft-delete flag; inactive products are hidden and cannot be sold
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields needed to create a product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub shop_id: String,
    pub category_id: Option<String>,
    pub brand_id: Option<String>,
    pub name: String,
    pub sku: String,
    pub cost_price: i64,
    pub sale_price: i64,
    pub low_stock_threshold: i32,
}

impl Product {
    pub fn new(new: NewProduct) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id: new.shop_id,
            category_id: new.category_id,
            brand_id: new.brand_id,
            name: new.name,
            sku: new.sku.trim().to_uppercase(),
            cost_price: new.cost_price,
            sale_price: new.sale_price,
            low_stock_threshold: new.low_stock_threshold,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update to a product
///
/// Also the payload of a `PRODUCT_UPDATE` approval request, so it must
/// round-trip through JSON.
#[derive(AsChangeset, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::products)]
#[serde(default, deny_unknown_fields)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub cost_price: Option<i64>,
    pub sale_price: Option<i64>,
    pub low_stock_threshold: Option<i32>,
    pub category_id: Option<String>,
    pub brand_id: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self == &ProductPatch::default()
    }

    /// Checks the patch on its own, without looking at the database
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("Product update must change at least one field".to_string());
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Product name cannot be empty".to_string());
            }
        }
        if self.cost_price.is_some_and(|p| p < 0) || self.sale_price.is_some_and(|p| p < 0) {
            return Err("Prices cannot be negative".to_string());
        }
        if self.low_stock_threshold.is_some_and(|t| t < 0) {
            return Err("Low stock threshold cannot be negative".to_string());
        }
        Ok(())
    }
}
