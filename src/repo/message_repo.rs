use crate::db::DbPool;
use crate::models::{Message, message::validate_body};
use crate::schema::{messages, shop_workers, shops};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use super::{not_found, validation};

/// Sends a message within a shop
///
/// A recipient, when given, must be the shop's owner or one of its active
/// workers. No recipient broadcasts to everyone in the shop.
///
/// ### Errors
///
/// Returns a `Validation` error for an empty or over-long body or a
/// recipient outside the shop
#[instrument(skip(pool, body))]
pub fn send_message(
    pool: &DbPool,
    shop_id: &str,
    sender_id: &str,
    recipient_id: Option<&str>,
    body: &str,
) -> Result<Message> {
    validate_body(body).map_err(|e| validation(e))?;
    let conn = &mut pool.get()?;

    if let Some(recipient_id) = recipient_id {
        let is_owner = shops::table
            .find(shop_id)
            .filter(shops::owner_id.eq(recipient_id))
            .count()
            .get_result::<i64>(conn)?
            > 0;
        let is_worker = shop_workers::table
            .filter(shop_workers::shop_id.eq(shop_id))
            .filter(shop_workers::user_id.eq(recipient_id))
            .filter(shop_workers::active.eq(true))
            .count()
            .get_result::<i64>(conn)?
            > 0;
        if !is_owner && !is_worker {
            return Err(validation("Recipient is not a member of this shop"));
        }
    }

    let message = Message::new(
        shop_id.to_string(),
        sender_id.to_string(),
        recipient_id.map(str::to_string),
        body.trim().to_string(),
    );
    diesel::insert_into(messages::table).values(&message).execute(conn)?;

    info!("Sent message {}", message.id);
    Ok(message)
}

/// Lists messages in a shop that `user_id` sent, received, or that were broadcast
#[instrument(skip(pool))]
pub fn list_messages_for(pool: &DbPool, shop_id: &str, user_id: &str) -> Result<Vec<Message>> {
    let conn = &mut pool.get()?;

    let result = messages::table
        .filter(messages::shop_id.eq(shop_id))
        .filter(
            messages::sender_id
                .eq(user_id)
                .or(messages::recipient_id.eq(user_id))
                .or(messages::recipient_id.is_null()),
        )
        .order(messages::created_at.desc())
        .load::<Message>(conn)?;

    debug!("Retrieved {} messages", result.len());
    Ok(result)
}

#[instrument(skip(pool))]
pub fn get_message(pool: &DbPool, id: &str) -> Result<Option<Message>> {
    let conn = &mut pool.get()?;
    Ok(messages::table.find(id).first::<Message>(conn).optional()?)
}

/// Marks a message read by its recipient
///
/// Reading twice keeps the first timestamp.
///
/// ### Errors
///
/// Returns a `Forbidden` error if `user_id` is not the message's recipient.
/// Broadcasts have no single recipient and cannot be marked read.
#[instrument(skip(pool))]
pub fn mark_read(pool: &DbPool, id: &str, user_id: &str) -> Result<Message> {
    let conn = &mut pool.get()?;

    let message = messages::table
        .find(id)
        .first::<Message>(conn)
        .optional()?
        .ok_or_else(|| not_found("Message"))?;
    if message.recipient_id.as_deref() != Some(user_id) {
        return Err(crate::errors::DomainError::Forbidden(
            "Only the recipient can mark a message as read".to_string(),
        )
        .into());
    }
    if message.read_at.is_some() {
        return Ok(message);
    }

    let now = Utc::now().naive_utc();
    diesel::update(messages::table.find(id)).set(messages::read_at.eq(now)).execute(conn)?;

    debug!("Marked message {} read", id);
    Ok(Message { read_at: Some(now), ..message })
}
