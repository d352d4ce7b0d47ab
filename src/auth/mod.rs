/// Authentication and authorization
///
/// Passwords are Argon2id PHC strings, sessions are stateless HS256 bearer
/// tokens, and every handler re-checks role and shop membership through the
/// helpers in `access`.

mod access;
mod extractor;
mod password;
mod token;

pub use access::{ensure_shop_access, ensure_shop_owner, require_role, require_super_admin};
pub use extractor::AuthUser;
pub use password::{hash_password, verify_password};
pub use token::{Claims, create_token, verify_token};
