use crate::{Result as ServerErrorResult, ServerError};

use std::sync::Arc;
use std::time::Duration;

use gw_auth::{
    Authorizer, KeyStore, RateLimitConfig, RateLimiterFactory, RouteAuthConfig, RouteRateLimiter,
};
use gw_config::RouteConfig;
use log::info;

/// Auth and rate limit policy of one configured route
pub struct RouteGuard {
    pub route_id: String,
    pub path: String,
    pub auth: Option<RouteAuthConfig>,
    pub rate_limiter: Option<RouteRateLimiter>,
    pub authorizer: Authorizer,
}

impl RouteGuard {
    /// Build the guard for `route`.
    ///
    /// Fails on a key location that does not parse or an impossible rate
    /// limit, so a bad route never starts serving.
    #[track_caller]
    pub fn from_config(
        route: &RouteConfig,
        authorizer: &Authorizer,
        factory: &RateLimiterFactory,
    ) -> ServerErrorResult<Self> {
        let auth = match &route.auth {
            Some(settings) => Some(
                RouteAuthConfig::new(&settings.key_location)
                    .map_err(|e| ServerError::route(&route.id, e))?
                    .with_roles_claim(settings.roles_claim.clone())
                    .with_required_roles(settings.required_roles.iter().cloned()),
            ),
            None => None,
        };

        let rate_limiter = match &route.rate_limit {
            Some(settings) => {
                let config = RateLimitConfig::new(
                    settings.limit,
                    Duration::from_secs(settings.window_secs),
                    &settings.key_location,
                )
                .map_err(|e| ServerError::route(&route.id, e))?;
                Some(
                    factory
                        .create(&route.id, config)
                        .map_err(|e| ServerError::route(&route.id, e))?,
                )
            }
            None => None,
        };

        info!(
            "Route '{}' on {}: auth={}, rate_limit={}",
            route.id,
            route.normalized_path(),
            auth.as_ref()
                .map(|a| a.key_location.to_string())
                .unwrap_or_else(|| "off".to_string()),
            route
                .rate_limit
                .as_ref()
                .map(|r| format!("{}/{}s", r.limit, r.window_secs))
                .unwrap_or_else(|| "off".to_string()),
        );

        Ok(Self {
            route_id: route.id.clone(),
            path: route.normalized_path().to_string(),
            auth,
            rate_limiter,
            authorizer: authorizer.clone(),
        })
    }
}

/// Shared state of the gateway router
#[derive(Clone)]
pub struct GatewayState {
    pub key_store: Arc<KeyStore>,
    pub guards: Arc<Vec<Arc<RouteGuard>>>,
}

impl GatewayState {
    #[track_caller]
    pub fn from_routes(
        routes: &[RouteConfig],
        key_store: Arc<KeyStore>,
        factory: &RateLimiterFactory,
    ) -> ServerErrorResult<Self> {
        let authorizer = Authorizer::new(Arc::clone(&key_store));
        let guards = routes
            .iter()
            .map(|route| RouteGuard::from_config(route, &authorizer, factory).map(Arc::new))
            .collect::<ServerErrorResult<Vec<_>>>()?;

        Ok(Self {
            key_store,
            guards: Arc::new(guards),
        })
    }

    /// Drop idle local rate limit buckets on every route
    pub fn retain_recent(&self) {
        for limiter in self.guards.iter().filter_map(|g| g.rate_limiter.as_ref()) {
            limiter.retain_recent();
        }
    }

    pub fn requires_keys(&self) -> bool {
        self.guards.iter().any(|g| g.auth.is_some())
    }
}
