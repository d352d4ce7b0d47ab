use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::{Role, Shop, User};
use crate::repo;

pub fn require_role(user: &User, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

pub fn require_super_admin(user: &User) -> Result<(), ApiError> {
    require_role(user, &[Role::SuperAdmin])
}

/// Loads a shop the user may read or trade in
///
/// Super admins may access any shop, owners only the shops they own, and
/// workers only shops where their link is active.
///
/// ### Errors
///
/// `NotFound` if the shop does not exist, `Forbidden` otherwise
pub fn ensure_shop_access(pool: &DbPool, user: &User, shop_id: &str) -> Result<Shop, ApiError> {
    let shop = repo::get_shop(pool, shop_id)?.ok_or_else(|| ApiError::not_found("Shop"))?;

    let allowed = match user.role {
        Role::SuperAdmin => true,
        Role::Owner => shop.owner_id == user.id,
        Role::Worker => repo::is_active_worker(pool, shop_id, &user.id)?,
    };

    if allowed { Ok(shop) } else { Err(ApiError::forbidden()) }
}

/// Loads a shop the user may manage: its owner or a super admin
pub fn ensure_shop_owner(pool: &DbPool, user: &User, shop_id: &str) -> Result<Shop, ApiError> {
    let shop = repo::get_shop(pool, shop_id)?.ok_or_else(|| ApiError::not_found("Shop"))?;

    if user.is_super_admin() || (user.role == Role::Owner && shop.owner_id == user.id) {
        Ok(shop)
    } else {
        Err(ApiError::forbidden())
    }
}
