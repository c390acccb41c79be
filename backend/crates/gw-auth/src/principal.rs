use crate::{Claims, claim_resolver};

use std::collections::HashSet;

use chrono::{DateTime, Utc};

/// Verified caller, available to downstream filters after authorization
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub key_id: String,
    pub subject: Option<String>,
    pub roles: HashSet<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub claims: Claims,
}

impl AuthenticatedPrincipal {
    pub fn from_claims(
        key_id: String,
        claims: Claims,
        roles_claim: &str,
        user_info: Option<&Claims>,
    ) -> Self {
        Self {
            key_id,
            subject: claims.subject().map(str::to_string),
            roles: claim_resolver::roles_from_claim(&claims, roles_claim, user_info),
            issued_at: claims
                .issued_at()
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            expires_at: claims
                .expires_at()
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            claims,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True when `required` is empty or shares a role with the principal
    pub fn has_any_role(&self, required: &[String]) -> bool {
        required.is_empty() || required.iter().any(|role| self.has_role(role))
    }

    /// Claim value for copying into an outbound header
    pub fn claim_as_string(&self, name: &str) -> Option<String> {
        self.claims.get(name).and_then(claim_resolver::claim_as_string)
    }

    pub fn claim_as_list(&self, name: &str) -> Vec<String> {
        self.claims
            .get(name)
            .map(claim_resolver::claim_as_list)
            .unwrap_or_default()
    }
}
