use crate::db::DbPool;
use crate::models::{AuditLog, Role, ShopWorker, User, WorkerWithUser};
use crate::schema::{shop_workers, users};
use anyhow::Result;
use diesel::prelude::*;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{insert_user, not_found, record_audit};

/// Creates a WORKER account and links it to a shop in one transaction
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `shop_id` - The shop the worker will belong to
/// * `name`, `email`, `password_hash` - The new account's details
/// * `actor_id` - The owner performing the action, for the audit log
///
/// ### Errors
///
/// Returns a `Conflict` if the email is taken; nothing is written in that case
#[instrument(skip(pool, password_hash), fields(shop_id = %shop_id, email = %email))]
pub fn add_worker(
    pool: &DbPool,
    shop_id: &str,
    name: String,
    email: &str,
    password_hash: String,
    actor_id: &str,
) -> Result<WorkerWithUser> {
    debug!("Adding worker to shop");
    let conn = &mut pool.get()?;

    let result = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let user = User::new(name, email, password_hash, Role::Worker);
        insert_user(conn, &user)?;

        let link = ShopWorker::new(shop_id.to_string(), user.id.clone());
        diesel::insert_into(shop_workers::table).values(&link).execute(conn)?;

        record_audit(
            conn,
            AuditLog::new(Some(shop_id), actor_id, "WORKER_ADDED", "user", &user.id, json!({"email": user.email})),
        )?;

        Ok(WorkerWithUser { link, user })
    })?;

    info!("Added worker {} to shop {}", result.user.id, shop_id);
    Ok(result)
}

/// Lists a shop's workers with their accounts, including deactivated links
#[instrument(skip(pool))]
pub fn list_workers(pool: &DbPool, shop_id: &str) -> Result<Vec<WorkerWithUser>> {
    let conn = &mut pool.get()?;

    let rows = shop_workers::table
        .inner_join(users::table)
        .filter(shop_workers::shop_id.eq(shop_id))
        .order(users::name.asc())
        .select((ShopWorker::as_select(), User::as_select()))
        .load::<(ShopWorker, User)>(conn)?;

    debug!("Retrieved {} workers", rows.len());
    Ok(rows.into_iter().map(|(link, user)| WorkerWithUser { link, user }).collect())
}

/// Returns whether `user_id` is an active worker of `shop_id`
pub fn is_active_worker(pool: &DbPool, shop_id: &str, user_id: &str) -> Result<bool> {
    let conn = &mut pool.get()?;
    let count = shop_workers::table
        .filter(shop_workers::shop_id.eq(shop_id))
        .filter(shop_workers::user_id.eq(user_id))
        .filter(shop_workers::active.eq(true))
        .count()
        .get_result::<i64>(conn)?;
    Ok(count > 0)
}

/// Deactivates a worker's link to a shop; the account itself is kept
///
/// ### Errors
///
/// Returns a `NotFound` if the user is not linked to the shop
#[instrument(skip(pool))]
pub fn remove_worker(pool: &DbPool, shop_id: &str, user_id: &str, actor_id: &str) -> Result<()> {
    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        let updated = diesel::update(
            shop_workers::table
                .filter(shop_workers::shop_id.eq(shop_id))
                .filter(shop_workers::user_id.eq(user_id)),
        )
        .set(shop_workers::active.eq(false))
        .execute(conn)?;
        if updated == 0 {
            return Err(not_found("Worker"));
        }

        record_audit(conn, AuditLog::new(Some(shop_id), actor_id, "WORKER_REMOVED", "user", user_id, json!({})))?;
        Ok(())
    })?;

    info!("Removed worker {} from shop {}", user_id, shop_id);
    Ok(())
}
