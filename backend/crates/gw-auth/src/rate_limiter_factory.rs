use crate::{BucketStore, RateLimitConfig, Result as AuthErrorResult, RouteRateLimiter};

use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(50);

/// Builds per-route rate limiters that share one optional [`BucketStore`]
#[derive(Clone)]
pub struct RateLimiterFactory {
    store: Option<Arc<dyn BucketStore>>,
    store_timeout: Duration,
}

impl RateLimiterFactory {
    pub fn new() -> Self {
        Self {
            store: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store(store: Arc<dyn BucketStore>, store_timeout: Duration) -> Self {
        Self {
            store: Some(store),
            store_timeout,
        }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    #[track_caller]
    pub fn create(&self, route_id: &str, config: RateLimitConfig) -> AuthErrorResult<RouteRateLimiter> {
        let limiter = RouteRateLimiter::new(route_id, config)?;
        Ok(match &self.store {
            Some(store) => limiter.with_store(Arc::clone(store), self.store_timeout),
            None => limiter,
        })
    }
}

impl Default for RateLimiterFactory {
    fn default() -> Self {
        Self::new()
    }
}
