use crate::db::DbPool;
use crate::models::{Role, User, normalize_email};
use crate::schema::users;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, instrument};

use super::{conflict, not_found};

/// Inserts a user on an existing connection, rejecting duplicate emails
///
/// Used directly by transactions that create a user alongside other rows.
pub fn insert_user(conn: &mut SqliteConnection, user: &User) -> Result<()> {
    let taken = users::table
        .filter(users::email.eq(&user.email))
        .count()
        .get_result::<i64>(conn)?;
    if taken > 0 {
        return Err(conflict(format!("Email {} is already registered", user.email)));
    }

    diesel::insert_into(users::table).values(user).execute(conn)?;
    Ok(())
}

/// Creates a new user
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `name` - The user's display name
/// * `email` - The login email (normalized to lowercase)
/// * `password_hash` - An Argon2 PHC string
/// * `role` - The role to grant
///
/// ### Errors
///
/// Returns a `Conflict` if the email is already registered, or an error if
/// the insert fails
#[instrument(skip(pool, password_hash), fields(email = %email, role = %role))]
pub fn create_user(pool: &DbPool, name: String, email: &str, password_hash: String, role: Role) -> Result<User> {
    debug!("Creating new user");
    let conn = &mut pool.get()?;

    let user = User::new(name, email, password_hash, role);
    insert_user(conn, &user)?;

    info!("Successfully created user with id: {}", user.id);
    Ok(user)
}

/// Retrieves a user by ID
#[instrument(skip(pool))]
pub fn get_user(pool: &DbPool, id: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table.find(id).first::<User>(conn).optional()?;
    Ok(user)
}

/// Retrieves a user by email, ignoring case
#[instrument(skip(pool))]
pub fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table
        .filter(users::email.eq(normalize_email(email)))
        .first::<User>(conn)
        .optional()?;
    Ok(user)
}

/// Lists users, optionally restricted to one role, oldest first
#[instrument(skip(pool))]
pub fn list_users(pool: &DbPool, role: Option<Role>) -> Result<Vec<User>> {
    let conn = &mut pool.get()?;

    let mut query = users::table.order(users::created_at.asc()).into_boxed();
    if let Some(role) = role {
        query = query.filter(users::role.eq(role));
    }
    let result = query.load::<User>(conn)?;

    debug!("Retrieved {} users", result.len());
    Ok(result)
}

/// Activates or deactivates a user
///
/// ### Errors
///
/// Returns a `NotFound` if no user has the given ID
#[instrument(skip(pool))]
pub fn set_user_active(pool: &DbPool, id: &str, active: bool) -> Result<User> {
    let conn = &mut pool.get()?;

    let updated = diesel::update(users::table.find(id))
        .set((users::active.eq(active), users::updated_at.eq(Utc::now().naive_utc())))
        .execute(conn)?;
    if updated == 0 {
        return Err(not_found("User"));
    }

    info!("Set user {} active={}", id, active);
    Ok(users::table.find(id).first::<User>(conn)?)
}
