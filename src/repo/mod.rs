/// Repository module
///
/// This module provides the data access layer for the application.
/// Every function takes the connection pool, checks out a connection, and
/// returns `anyhow::Result`. Business-rule failures are raised as
/// [`DomainError`] so handlers can map them to status codes.
///
/// Writes that touch more than one table run inside a single diesel
/// transaction and take `&mut SqliteConnection` helpers from sibling modules
/// (for example [`record_audit`]) rather than checking out a second connection.

mod user_repo;
mod shop_repo;
mod worker_repo;
mod catalog_repo;
mod inventory_repo;
mod sale_repo;
mod purchase_repo;
mod approval_repo;
mod audit_repo;
mod message_repo;
mod closing_repo;

// Re-export all repository functions
pub use user_repo::*;
pub use shop_repo::*;
pub use worker_repo::*;
pub use catalog_repo::*;
pub use inventory_repo::*;
pub use sale_repo::*;
pub use purchase_repo::*;
pub use approval_repo::*;
pub use audit_repo::*;
pub use message_repo::*;
pub use closing_repo::*;

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::DomainError;

pub(crate) fn not_found(what: &str) -> anyhow::Error {
    DomainError::NotFound(format!("{} not found", what)).into()
}

pub(crate) fn validation(msg: impl Into<String>) -> anyhow::Error {
    DomainError::Validation(msg.into()).into()
}

pub(crate) fn conflict(msg: impl Into<String>) -> anyhow::Error {
    DomainError::Conflict(msg.into()).into()
}

/// Returns the half-open UTC range `[date 00:00, date+1 00:00)`
pub(crate) fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let end = start + chrono::Duration::days(1);
    (start, end)
}
