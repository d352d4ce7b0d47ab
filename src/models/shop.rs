use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// A single retail store; the tenant boundary for all shop data
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::shops)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub owner_id: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Shop {
    pub fn new(name: String, address: String, phone: String, owner_id: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            address,
            phone,
            owner_id,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Links a worker account to the shop it works in
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::shop_workers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ShopWorker {
    pub id: String,
    pub shop_id: String,
    pub user_id: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

impl ShopWorker {
    pub fn new(shop_id: String, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            user_id,
            active: true,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// A worker link together with the worker's account, as listed for owners
#[derive(Debug, Clone, Serialize)]
pub struct WorkerWithUser {
    #[serde(flatten)]
    pub link: ShopWorker,
    pub user: User,
}

/// Headline numbers for a shop's dashboard
///
/// Money fields are in paisa.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopStats {
    pub product_count: i64,
    pub total_stock_units: i64,
    pub low_stock_count: i64,
    pub inventory_value: i64,
    pub sales_today_count: i64,
    pub sales_today_total: i64,
    pub purchases_outstanding: i64,
    pub pending_approvals: i64,
    pub worker_count: i64,
}
