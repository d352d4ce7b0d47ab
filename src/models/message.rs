use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_MESSAGE_LEN: usize = 2000;

/// An in-shop note between staff; no recipient means it goes to everyone in the shop
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Message {
    pub id: String,
    pub shop_id: String,
    pub sender_id: String,
    pub recipient_id: Option<String>,
    pub body: String,
    pub read_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Message {
    pub fn new(shop_id: String, sender_id: String, recipient_id: Option<String>, body: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            sender_id,
            recipient_id,
            body,
            read_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.recipient_id.is_none()
    }
}

pub fn validate_body(body: &str) -> Result<(), String> {
    let len = body.trim().chars().count();
    if len == 0 {
        return Err("Message body cannot be empty".to_string());
    }
    if len > MAX_MESSAGE_LEN {
        return Err(format!("Message body cannot exceed {} characters", MAX_MESSAGE_LEN));
    }
    Ok(())
}
