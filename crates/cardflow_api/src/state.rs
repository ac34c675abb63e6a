use std::sync::Arc;
use std::time::Duration;

use cardflow_db::DbPool;
use cardflow_security::{AuthToken, PortalToken, TokenBucketLimiter};

use crate::cache::DashboardCache;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub admin_tokens: Arc<AuthToken>,
    pub portal_tokens: Arc<PortalToken>,
    pub verify_limiter: Arc<TokenBucketLimiter>,
    pub dashboard_cache: Arc<DashboardCache>,
}

pub struct AppConfig {
    pub jwt_secret: String,
    pub admin_ttl_seconds: i64,
    pub portal_ttl_seconds: i64,
    pub dashboard_cache_ttl_seconds: u64,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        Self {
            pool,
            admin_tokens: Arc::new(AuthToken::new(config.jwt_secret.clone()).with_ttl_seconds(config.admin_ttl_seconds)),
            portal_tokens: Arc::new(PortalToken::new(config.jwt_secret).with_ttl_seconds(config.portal_ttl_seconds)),
            verify_limiter: Arc::new(TokenBucketLimiter::default_portal_limiter()),
            dashboard_cache: Arc::new(DashboardCache::new(Duration::from_secs(config.dashboard_cache_ttl_seconds))),
        }
    }
}
