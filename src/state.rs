use std::sync::Arc;

use crate::config::{Config, RateLimitBackend};
use crate::db::DbPool;
use crate::rate_limit::{API_SCOPE, DatabaseStore, LOGIN_SCOPE, MemoryStore, RateLimitStore, RateLimiter};

/// Token settings shared by the sign-in handler and the `AuthUser` extractor
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub auth: Arc<AuthSettings>,
    pub login_limiter: Arc<RateLimiter>,
    pub api_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(pool: Arc<DbPool>, config: &Config) -> Self {
        let store = |scope: &str| -> Arc<dyn RateLimitStore> {
            match config.rate_limit_backend {
                RateLimitBackend::Database => Arc::new(DatabaseStore::scoped(pool.clone(), scope)),
                RateLimitBackend::Memory => Arc::new(MemoryStore::new()),
            }
        };

        Self {
            auth: Arc::new(AuthSettings {
                jwt_secret: config.jwt_secret.clone(),
                token_ttl_hours: config.token_ttl_hours,
            }),
            login_limiter: Arc::new(RateLimiter::new(store(LOGIN_SCOPE), config.login_rate_limit)),
            api_limiter: Arc::new(RateLimiter::new(store(API_SCOPE), config.api_rate_limit)),
            pool,
        }
    }
}
