use crate::{KeyLocation, Result as AuthErrorResult};

pub const DEFAULT_ROLES_CLAIM: &str = "roles";

/// Per-route authorization settings, fixed at route registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAuthConfig {
    pub key_location: KeyLocation,
    /// Dotted claim path holding the caller's roles
    pub roles_claim: String,
    /// Caller needs at least one of these; empty means no role gate
    pub required_roles: Vec<String>,
}

impl RouteAuthConfig {
    /// Parse `key_location` (literal, `{header:Name}` or `{claim:Name}`)
    #[track_caller]
    pub fn new(key_location: &str) -> AuthErrorResult<Self> {
        Ok(Self {
            key_location: key_location.parse()?,
            roles_claim: DEFAULT_ROLES_CLAIM.to_string(),
            required_roles: Vec::new(),
        })
    }

    pub fn with_roles_claim(mut self, roles_claim: impl Into<String>) -> Self {
        self.roles_claim = roles_claim.into();
        self
    }

    pub fn with_required_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_roles = roles.into_iter().map(Into::into).collect();
        self
    }
}
