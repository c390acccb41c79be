use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_ROLES_CLAIM, MAX_RATE_LIMIT,
    MAX_RATE_LIMIT_WINDOW_SECS, MIN_RATE_LIMIT, MIN_RATE_LIMIT_WINDOW_SECS,
};

use serde::Deserialize;

const RESERVED_PATHS: [&str; 3] = ["/health", "/live", "/ready"];

/// One protected route (`[[routes]]`)
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub id: String,
    /// Path prefix the route guards
    pub path: String,
    #[serde(default)]
    pub auth: Option<RouteAuthSettings>,
    #[serde(default)]
    pub rate_limit: Option<RouteRateLimitSettings>,
}

/// `[routes.auth]`
#[derive(Debug, Clone, Deserialize)]
pub struct RouteAuthSettings {
    /// Literal key id, `{header:Name}` or `{claim:Name}`
    pub key_location: String,
    #[serde(default = "default_roles_claim")]
    pub roles_claim: String,
    #[serde(default)]
    pub required_roles: Vec<String>,
}

/// `[routes.rate_limit]`
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRateLimitSettings {
    pub limit: u32,
    pub window_secs: u64,
    /// `claim:Name`, `header:Name`, `IPs:[N;]ip;...` or a static key
    pub key_location: String,
}

fn default_roles_claim() -> String {
    String::from(DEFAULT_ROLES_CLAIM)
}

impl RouteConfig {
    /// Path without trailing slashes; the root stays `/`
    pub fn normalized_path(&self) -> &str {
        match self.path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        }
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::route("routes.id must not be empty"));
        }

        if !self.path.starts_with('/') {
            return Err(ConfigError::route(format!(
                "route '{}': path must start with '/', got '{}'",
                self.id, self.path
            )));
        }

        if self.path.contains(['{', '}', '*']) {
            return Err(ConfigError::route(format!(
                "route '{}': path must be a literal prefix, got '{}'",
                self.id, self.path
            )));
        }

        if RESERVED_PATHS.contains(&self.normalized_path()) {
            return Err(ConfigError::route(format!(
                "route '{}': path '{}' is reserved for health probes",
                self.id, self.path
            )));
        }

        if let Some(auth) = &self.auth {
            if auth.key_location.trim().is_empty() {
                return Err(ConfigError::route(format!(
                    "route '{}': auth.key_location must not be empty",
                    self.id
                )));
            }
            if auth.roles_claim.trim().is_empty() {
                return Err(ConfigError::route(format!(
                    "route '{}': auth.roles_claim must not be empty",
                    self.id
                )));
            }
        }

        if let Some(rate_limit) = &self.rate_limit {
            rate_limit.validate(&self.id)?;
        }

        Ok(())
    }
}

impl RouteRateLimitSettings {
    fn validate(&self, route_id: &str) -> ConfigErrorResult<()> {
        if !(MIN_RATE_LIMIT..=MAX_RATE_LIMIT).contains(&self.limit) {
            return Err(ConfigError::route(format!(
                "route '{}': rate_limit.limit must be {}-{}, got {}",
                route_id, MIN_RATE_LIMIT, MAX_RATE_LIMIT, self.limit
            )));
        }

        if !(MIN_RATE_LIMIT_WINDOW_SECS..=MAX_RATE_LIMIT_WINDOW_SECS).contains(&self.window_secs) {
            return Err(ConfigError::route(format!(
                "route '{}': rate_limit.window_secs must be {}-{}, got {}",
                route_id, MIN_RATE_LIMIT_WINDOW_SECS, MAX_RATE_LIMIT_WINDOW_SECS, self.window_secs
            )));
        }

        if self.key_location.trim().is_empty() {
            return Err(ConfigError::route(format!(
                "route '{route_id}': rate_limit.key_location must not be empty"
            )));
        }

        Ok(())
    }
}
