use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_STORE_TIMEOUT_MS, MAX_STORE_TIMEOUT_MS,
    MIN_STORE_TIMEOUT_MS,
};

use serde::Deserialize;

/// Optional shared bucket store; local buckets only when `redis_url` is unset
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitStoreConfig {
    pub redis_url: Option<String>,
    /// Upper bound on one store round trip before falling back to local buckets
    pub timeout_ms: u64,
}

impl Default for RateLimitStoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
        }
    }
}

impl RateLimitStoreConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if let Some(url) = &self.redis_url
            && !(url.starts_with("redis://") || url.starts_with("rediss://"))
        {
            return Err(ConfigError::rate_limit_store(
                "rate_limit_store.redis_url must start with redis:// or rediss://",
            ));
        }

        if !(MIN_STORE_TIMEOUT_MS..=MAX_STORE_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::rate_limit_store(format!(
                "rate_limit_store.timeout_ms must be {}-{}, got {}",
                MIN_STORE_TIMEOUT_MS, MAX_STORE_TIMEOUT_MS, self.timeout_ms
            )));
        }

        Ok(())
    }
}
