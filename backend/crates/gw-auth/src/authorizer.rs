use crate::{
    AuthenticatedPrincipal, GatewayRequest, KeyStore, RouteAuthConfig, TokenVerifier,
    claim_resolver, key_parser,
};

use std::sync::Arc;

use log::{debug, error, warn};
use metrics::counter;

/// Why a request was not allowed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingToken,
    UnresolvedKeyId,
    UnknownKey,
    InvalidKeyMaterial,
    InvalidToken,
    InsufficientRole,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::UnresolvedKeyId => "unresolved_key_id",
            Self::UnknownKey => "unknown_key",
            Self::InvalidKeyMaterial => "invalid_key_material",
            Self::InvalidToken => "invalid_token",
            Self::InsufficientRole => "insufficient_role",
        }
    }

    /// Authenticated but not permitted (403) as opposed to unauthenticated (401)
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::InsufficientRole)
    }
}

#[derive(Debug, Clone)]
pub enum AuthDecision {
    Allow(AuthenticatedPrincipal),
    Deny(DenyReason),
}

impl AuthDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Decides whether a request may reach a protected route
#[derive(Clone)]
pub struct Authorizer {
    key_store: Arc<KeyStore>,
    verifier: TokenVerifier,
}

impl Authorizer {
    pub fn new(key_store: Arc<KeyStore>) -> Self {
        Self {
            key_store,
            verifier: TokenVerifier::new(),
        }
    }

    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.key_store
    }

    pub fn authorize(&self, request: &GatewayRequest<'_>, route: &RouteAuthConfig) -> AuthDecision {
        let decision = self.decide(request, route);

        let (outcome, reason) = match &decision {
            AuthDecision::Allow(_) => ("allow", "none"),
            AuthDecision::Deny(reason) => ("deny", reason.as_str()),
        };
        counter!("gateway_auth_decisions_total", "outcome" => outcome, "reason" => reason)
            .increment(1);

        decision
    }

    fn decide(&self, request: &GatewayRequest<'_>, route: &RouteAuthConfig) -> AuthDecision {
        let Some(token) = request.bearer_token() else {
            debug!("No bearer token on request");
            return AuthDecision::Deny(DenyReason::MissingToken);
        };

        let Some(key_id) = route.key_location.resolve(request) else {
            debug!("Could not resolve key id from {}", route.key_location);
            return AuthDecision::Deny(DenyReason::UnresolvedKeyId);
        };

        let Some(entry) = self.key_store.get_key(&key_id) else {
            debug!("No signing key with id '{}'", key_id);
            return AuthDecision::Deny(DenyReason::UnknownKey);
        };

        let key = match key_parser::parse_key_entry(&entry) {
            Ok(key) => key,
            Err(e) => {
                warn!("Signing key '{}' could not be parsed: {}", key_id, e);
                return AuthDecision::Deny(DenyReason::InvalidKeyMaterial);
            }
        };

        match self.verifier.verify_detailed(token, &key) {
            Ok(outcome) if outcome.is_valid() => {}
            Ok(outcome) => {
                debug!("Token signed with key '{}' rejected: {}", key_id, outcome.as_str());
                return AuthDecision::Deny(DenyReason::InvalidToken);
            }
            Err(e) => {
                error!("Signing key '{}' is unusable: {}", key_id, e);
                return AuthDecision::Deny(DenyReason::InvalidKeyMaterial);
            }
        }

        let principal = AuthenticatedPrincipal::from_claims(
            key_id,
            claim_resolver::claims(token),
            &route.roles_claim,
            None,
        );

        if !principal.has_any_role(&route.required_roles) {
            debug!(
                "Principal {:?} lacks any of the roles {:?}",
                principal.subject, route.required_roles
            );
            return AuthDecision::Deny(DenyReason::InsufficientRole);
        }

        AuthDecision::Allow(principal)
    }
}
