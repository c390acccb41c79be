use crate::{AuthError, BucketStore, RateLimitConfig, RateLimitKey, Result as AuthErrorResult};

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use error_location::ErrorLocation;
use governor::clock::{Clock, DefaultClock};
use governor::middleware::{NoOpMiddleware, StateInformationMiddleware};
use governor::state::keyed::DashMapStateStore;
use governor::RateLimiter;
use log::{debug, warn};
use metrics::counter;

type KeyedLimiter<C> =
    RateLimiter<String, DashMapStateStore<String>, C, StateInformationMiddleware>;

/// Result of taking a token from a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    /// Tokens left after this request (`X-Remaining`)
    pub remaining_tokens: u32,
    /// Milliseconds until a token is available when denied (`X-Retry-In`)
    pub retry_after_ms: u64,
}

impl RateLimitOutcome {
    pub fn allowed(remaining_tokens: u32) -> Self {
        Self {
            allowed: true,
            remaining_tokens,
            retry_after_ms: 0,
        }
    }

    pub fn denied(retry_after_ms: u64) -> Self {
        Self {
            allowed: false,
            remaining_tokens: 0,
            retry_after_ms,
        }
    }
}

/// Token buckets for one route, one bucket per caller identity.
///
/// Local buckets are GCRA cells updated by compare-and-swap, so concurrent
/// requests for the same identity never overdraw it. With a [`BucketStore`]
/// configured the shared store is authoritative and local buckets are the
/// fallback when it is slow or down.
pub struct RouteRateLimiter<C: Clock = DefaultClock> {
    route_id: String,
    config: RateLimitConfig,
    limiter: KeyedLimiter<C>,
    clock: C,
    store: Option<Arc<dyn BucketStore>>,
    store_timeout: Duration,
}

impl RouteRateLimiter<DefaultClock> {
    #[track_caller]
    pub fn new(route_id: impl Into<String>, config: RateLimitConfig) -> AuthErrorResult<Self> {
        Self::with_clock(route_id, config, DefaultClock::default())
    }
}

impl<C: Clock + Clone> RouteRateLimiter<C> {
    #[track_caller]
    pub fn with_clock(
        route_id: impl Into<String>,
        config: RateLimitConfig,
        clock: C,
    ) -> AuthErrorResult<Self> {
        let quota = config.quota()?;
        let limiter = RateLimiter::<
            String,
            DashMapStateStore<String>,
            C,
            NoOpMiddleware<C::Instant>,
        >::new(quota, DashMapStateStore::default(), clock.clone())
        .with_middleware::<StateInformationMiddleware>();

        Ok(Self {
            route_id: route_id.into(),
            config,
            limiter,
            clock,
            store: None,
            store_timeout: Duration::ZERO,
        })
    }

    /// Consult `store` first, bounded by `timeout`
    pub fn with_store(mut self, store: Arc<dyn BucketStore>, timeout: Duration) -> Self {
        self.store = Some(store);
        self.store_timeout = timeout;
        self
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub async fn consume(&self, key: &RateLimitKey) -> RateLimitOutcome {
        let outcome = match key {
            RateLimitKey::Missing => {
                debug!("Route '{}': no rate limit identity on request", self.route_id);
                RateLimitOutcome::denied(self.config.window_millis())
            }
            RateLimitKey::Unrestricted => RateLimitOutcome::allowed(self.config.limit),
            RateLimitKey::Identity(identity) => match &self.store {
                Some(store) => self.consume_shared(store.as_ref(), identity).await,
                None => self.consume_local(identity),
            },
        };

        let result = if outcome.allowed { "allow" } else { "deny" };
        counter!("gateway_rate_limit_decisions_total", "outcome" => result).increment(1);

        outcome
    }

    /// Take a token from the in-process bucket for `identity`
    pub fn consume_local(&self, identity: &str) -> RateLimitOutcome {
        match self.limiter.check_key(&identity.to_string()) {
            Ok(snapshot) => RateLimitOutcome::allowed(snapshot.remaining_burst_capacity()),
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                RateLimitOutcome::denied(retry_millis(wait))
            }
        }
    }

    async fn consume_shared(&self, store: &dyn BucketStore, identity: &str) -> RateLimitOutcome {
        let result = match tokio::time::timeout(
            self.store_timeout,
            store.try_consume(&self.route_id, identity, &self.config),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AuthError::RateLimitStoreTimeout {
                timeout_ms: u64::try_from(self.store_timeout.as_millis()).unwrap_or(u64::MAX),
                location: ErrorLocation::from(Location::caller()),
            }),
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    "Route '{}': rate limit store unavailable, using local bucket: {}",
                    self.route_id, e
                );
                counter!("gateway_rate_limit_store_fallback_total").increment(1);
                self.consume_local(identity)
            }
        }
    }

    /// Forget local buckets that have refilled completely
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    /// Number of local buckets currently held
    pub fn len(&self) -> usize {
        self.limiter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiter.is_empty()
    }
}

// Round up so a client never retries a moment too early
fn retry_millis(wait: Duration) -> u64 {
    let millis = wait.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX).max(1)
}
