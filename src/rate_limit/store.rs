use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use diesel::prelude::*;
use tracing::debug;

use crate::db::DbPool;
use crate::schema::rate_limit_hits;

/// Counts hits per key within a sliding window
pub trait RateLimitStore: Send + Sync {
    /// Records a hit for `key` at `now` and returns how many hits fall inside
    /// the window ending at `now`, this one included
    fn hit(&self, key: &str, now: DateTime<Utc>, window: Duration) -> Result<u32>;

    /// Drops hits older than the window ending at `now` and returns how many were dropped
    fn purge_expired(&self, now: DateTime<Utc>, window: Duration) -> Result<usize>;
}

fn cutoff(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Per-process store; hits are lost on restart and not shared between processes
#[derive(Debug, Default)]
pub struct MemoryStore {
    hits: DashMap<String, VecDeque<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infallible form of [`RateLimitStore::hit`]
    pub fn record(&self, key: &str, now: DateTime<Utc>, window: Duration) -> u32 {
        let cutoff = cutoff(now, window);
        let mut entry = self.hits.entry(key.to_string()).or_default();
        while entry.front().is_some_and(|t| *t <= cutoff) {
            entry.pop_front();
        }
        entry.push_back(now);
        entry.len() as u32
    }

    pub fn key_count(&self) -> usize {
        self.hits.len()
    }
}

impl RateLimitStore for MemoryStore {
    fn hit(&self, key: &str, now: DateTime<Utc>, window: Duration) -> Result<u32> {
        Ok(self.record(key, now, window))
    }

    fn purge_expired(&self, now: DateTime<Utc>, window: Duration) -> Result<usize> {
        let cutoff = cutoff(now, window);
        let mut purged = 0;
        self.hits.retain(|_, hits| {
            let before = hits.len();
            hits.retain(|t| *t > cutoff);
            purged += before - hits.len();
            !hits.is_empty()
        });
        Ok(purged)
    }
}

#[derive(Insertable)]
#[diesel(table_name = rate_limit_hits)]
struct NewHit<'a> {
    key: &'a str,
    hit_at: chrono::NaiveDateTime,
}

/// Store backed by the `rate_limit_hits` table, shared by every process on the database
///
/// A store built with [`DatabaseStore::scoped`] only purges keys under its
/// own scope, so limiters with different windows can share the table.
#[derive(Clone)]
pub struct DatabaseStore {
    pool: Arc<DbPool>,
    scope: Option<String>,
}

impl DatabaseStore {
    /// A store whose purge covers every key in the table
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool, scope: None }
    }

    /// A store whose purge only touches keys starting with `scope:`
    pub fn scoped(pool: Arc<DbPool>, scope: &str) -> Self {
        Self { pool, scope: Some(scope.to_string()) }
    }
}

impl RateLimitStore for DatabaseStore {
    fn hit(&self, key: &str, now: DateTime<Utc>, window: Duration) -> Result<u32> {
        let conn = &mut self.pool.get()?;
        let cutoff = cutoff(now, window).naive_utc();

        let count = conn.transaction::<_, anyhow::Error, _>(|conn| {
            diesel::delete(
                rate_limit_hits::table
                    .filter(rate_limit_hits::key.eq(key))
                    .filter(rate_limit_hits::hit_at.le(cutoff)),
            )
            .execute(conn)?;

            diesel::insert_into(rate_limit_hits::table)
                .values(&NewHit { key, hit_at: now.naive_utc() })
                .execute(conn)?;

            Ok(rate_limit_hits::table
                .filter(rate_limit_hits::key.eq(key))
                .count()
                .get_result::<i64>(conn)?)
        })?;

        Ok(count as u32)
    }

    fn purge_expired(&self, now: DateTime<Utc>, window: Duration) -> Result<usize> {
        let conn = &mut self.pool.get()?;
        let cutoff = cutoff(now, window).naive_utc();

        let mut query = diesel::delete(rate_limit_hits::table)
            .filter(rate_limit_hits::hit_at.le(cutoff))
            .into_boxed();
        if let Some(scope) = &self.scope {
            query = query.filter(rate_limit_hits::key.like(format!("{}:%", scope)));
        }

        let purged = query.execute(conn)?;
        debug!(purged, scope = ?self.scope, "Purged expired rate-limit hits");
        Ok(purged)
    }
}
