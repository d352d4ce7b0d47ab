use crate::db::DbPool;
use crate::models::AuditLog;
use crate::schema::audit_logs;
use anyhow::Result;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, instrument};

pub const DEFAULT_AUDIT_LIMIT: i64 = 100;
pub const MAX_AUDIT_LIMIT: i64 = 500;

/// Appends an audit entry on an existing connection
///
/// Callers pass the connection of the transaction that made the change so
/// the entry is written if and only if the change is.
pub fn record_audit(conn: &mut SqliteConnection, entry: AuditLog) -> Result<()> {
    debug!(action = %entry.action, entity_id = %entry.entity_id, "Recording audit entry");
    diesel::insert_into(audit_logs::table).values(&entry).execute(conn)?;
    Ok(())
}

/// Lists a shop's audit entries, newest first
///
/// `limit` defaults to 100 and is clamped to `1..=500`.
#[instrument(skip(pool))]
pub fn list_audit_logs(pool: &DbPool, shop_id: &str, limit: Option<i64>) -> Result<Vec<AuditLog>> {
    let conn = &mut pool.get()?;
    let limit = limit.unwrap_or(DEFAULT_AUDIT_LIMIT).clamp(1, MAX_AUDIT_LIMIT);

    let result = audit_logs::table
        .filter(audit_logs::shop_id.eq(shop_id))
        .order(audit_logs::created_at.desc())
        .limit(limit)
        .load::<AuditLog>(conn)?;

    debug!("Retrieved {} audit entries", result.len());
    Ok(result)
}
