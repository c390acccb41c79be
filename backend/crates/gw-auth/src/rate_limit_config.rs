use crate::{AuthError, RateLimitKeySource, Result as AuthErrorResult};

use std::num::NonZeroU32;
use std::panic::Location;
use std::time::Duration;

use error_location::ErrorLocation;
use governor::Quota;

/// Per-route rate limit: `limit` requests per `window` for each identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub limit: u32,
    pub window: Duration,
    pub key_location: RateLimitKeySource,
}

impl RateLimitConfig {
    #[track_caller]
    pub fn new(limit: u32, window: Duration, key_location: &str) -> AuthErrorResult<Self> {
        let config = Self {
            limit,
            window,
            key_location: key_location.parse()?,
        };
        config.quota()?;
        Ok(config)
    }

    /// Burst of `limit`, refilled continuously at `limit` per `window`
    #[track_caller]
    pub(crate) fn quota(&self) -> AuthErrorResult<Quota> {
        let invalid = |message: String| AuthError::InvalidRateLimit {
            message,
            location: ErrorLocation::from(Location::caller()),
        };

        let burst = NonZeroU32::new(self.limit)
            .ok_or_else(|| invalid("limit must be at least 1".to_string()))?;
        let period = self.window / self.limit;

        Quota::with_period(period)
            .map(|quota| quota.allow_burst(burst))
            .ok_or_else(|| invalid(format!("window {:?} is too short for limit {}", self.window, self.limit)))
    }

    pub fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }

    /// Tokens added per millisecond
    pub fn refill_rate_per_ms(&self) -> f64 {
        f64::from(self.limit) / self.window.as_secs_f64() / 1000.0
    }
}
