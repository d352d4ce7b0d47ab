use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// An account that can sign in: a super admin, a shop owner, or a worker
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    /// Unique identifier for the user (UUID v4 as string)
    pub id: String,

    /// Display name
    pub name: String,

    /// Login email, always stored lowercase
    pub email: String,

    /// Argon2 PHC string; never sent over the wire
    #[serde(skip_serializing, default)]
    password_hash: String,

    pub role: Role,

    /// Inactive users cannot sign in and existing tokens stop working
    pub active: bool,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// Creates a new active user
    ///
    /// ### Arguments
    ///
    /// * `name` - The user's display name
    /// * `email` - The login email; normalized to lowercase
    /// * `password_hash` - An already-hashed password
    /// * `role` - The role the user holds
    pub fn new(name: String, email: &str, password_hash: String, role: Role) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email: normalize_email(email),
            password_hash,
            role,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

/// Lowercases and trims an email so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks the minimal shape of an email address: a local part, an `@`, and a dotted domain
pub fn is_valid_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    }
}
