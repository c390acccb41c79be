use crate::{AuthError, RateLimitConfig, RateLimitOutcome, Result as AuthErrorResult};

use std::panic::Location;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use error_location::ErrorLocation;
use log::{debug, info, warn};
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use tokio::sync::OnceCell;

const KEY_PREFIX: &str = "gateway_rate_limit";
const CONNECT_RETRY_MIN: Duration = Duration::from_secs(1);
const CONNECT_RETRY_MAX: Duration = Duration::from_secs(30);

/// Shared token bucket state, so several gateway instances enforce one limit
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Take one token from the `(route_id, identity)` bucket
    async fn try_consume(
        &self,
        route_id: &str,
        identity: &str,
        config: &RateLimitConfig,
    ) -> AuthErrorResult<RateLimitOutcome>;
}

// Refill is computed from the server clock so every gateway agrees on "now"
const TOKEN_BUCKET_SCRIPT: &str = r#"
local tokens_key = KEYS[1]
local timestamp_key = KEYS[2]
local rate = tonumber(ARGV[1])
local capacity = tonumber(ARGV[2])
local ttl_ms = tonumber(ARGV[3])

local time = redis.call('TIME')
local now = tonumber(time[1]) * 1000 + math.floor(tonumber(time[2]) / 1000)

local tokens = tonumber(redis.call('GET', tokens_key))
if tokens == nil then
  tokens = capacity
end
local refreshed = tonumber(redis.call('GET', timestamp_key))
if refreshed == nil then
  refreshed = now
end

local filled = math.min(capacity, tokens + math.max(0, now - refreshed) * rate)
local allowed = 0
local retry_after = 0
if filled >= 1 then
  filled = filled - 1
  allowed = 1
else
  retry_after = math.max(1, math.ceil((1 - filled) / rate))
end

redis.call('SET', tokens_key, tostring(filled), 'PX', ttl_ms)
redis.call('SET', timestamp_key, now, 'PX', ttl_ms)

return { allowed, math.floor(filled), retry_after }
"#;

/// [`BucketStore`] backed by a Redis token bucket script.
///
/// The connection is opened by a background task, never on the request path.
/// Until it is up every call fails fast and callers use their local buckets.
/// Once connected, [`ConnectionManager`] reconnects on its own.
pub struct RedisBucketStore {
    connection: Arc<OnceCell<ConnectionManager>>,
    script: Script,
}

impl RedisBucketStore {
    /// Start connecting in the background. Must be called from within a tokio
    /// runtime.
    #[track_caller]
    pub fn new(redis_url: &str) -> AuthErrorResult<Self> {
        let client = Client::open(redis_url).map_err(|source| AuthError::RateLimitStore {
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let connection = Arc::new(OnceCell::new());
        tokio::spawn(connect_loop(client, Arc::downgrade(&connection)));

        info!("Rate limit store configured, connecting in the background");

        Ok(Self {
            connection,
            script: Script::new(TOKEN_BUCKET_SCRIPT),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }
}

// Retries until connected or the store is dropped
async fn connect_loop(client: Client, connection: Weak<OnceCell<ConnectionManager>>) {
    let mut delay = CONNECT_RETRY_MIN;

    loop {
        let attempt = ConnectionManager::new(client.clone()).await;

        let Some(cell) = connection.upgrade() else {
            return;
        };

        match attempt {
            Ok(manager) => {
                // Only this task sets the cell
                let _ = cell.set(manager);
                info!("Connected to rate limit store");
                return;
            }
            Err(e) => {
                warn!(
                    "Could not connect to rate limit store, retrying in {}s: {}",
                    delay.as_secs(),
                    e
                );
            }
        }

        drop(cell);
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(CONNECT_RETRY_MAX);
    }
}

/// `gateway_rate_limit.{route.identity}.tokens` and `.timestamp`.
///
/// The braces keep both keys of a bucket in one cluster slot.
pub fn bucket_keys(route_id: &str, identity: &str) -> (String, String) {
    let prefix = format!("{KEY_PREFIX}.{{{route_id}.{identity}}}");
    (format!("{prefix}.tokens"), format!("{prefix}.timestamp"))
}

#[async_trait]
impl BucketStore for RedisBucketStore {
    async fn try_consume(
        &self,
        route_id: &str,
        identity: &str,
        config: &RateLimitConfig,
    ) -> AuthErrorResult<RateLimitOutcome> {
        let (tokens_key, timestamp_key) = bucket_keys(route_id, identity);
        // Keep idle buckets around for two windows
        let ttl_ms = config.window_millis().saturating_mul(2).max(1);

        let Some(connection) = self.connection.get() else {
            debug!("Rate limit store not connected yet");
            return Err(AuthError::RateLimitStoreUnavailable {
                location: ErrorLocation::from(Location::caller()),
            });
        };
        let mut connection = connection.clone();

        let result: redis::RedisResult<(i64, i64, i64)> = self
            .script
            .key(&tokens_key)
            .key(&timestamp_key)
            .arg(config.refill_rate_per_ms())
            .arg(config.limit)
            .arg(ttl_ms)
            .invoke_async(&mut connection)
            .await;

        match result {
            Ok((allowed, remaining, retry_after_ms)) => Ok(RateLimitOutcome {
                allowed: allowed == 1,
                remaining_tokens: u32::try_from(remaining.max(0)).unwrap_or(u32::MAX),
                retry_after_ms: u64::try_from(retry_after_ms.max(0)).unwrap_or(0),
            }),
            Err(source) => Err(AuthError::RateLimitStore {
                source,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
