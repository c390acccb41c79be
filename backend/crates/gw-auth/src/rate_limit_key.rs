use crate::key_location::split_indirection;
use crate::{AuthError, GatewayRequest, Result as AuthErrorResult, claim_resolver, client_address};

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use log::debug;

/// Bucket key used when a header or claim identity cannot be found
pub const MISSING_RATE_LIMIT_KEY: &str = "MISSING_RATE_LIMIT_KEY";

const DEFAULT_MAX_TRUSTED_INDEX: usize = 1;

/// Identity a request is rate limited under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateLimitKey {
    Identity(String),
    /// The configured header or claim was absent; always denied
    Missing,
    /// Client address is not on the route's allow-list; not rate limited
    Unrestricted,
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity(identity) => write!(f, "{identity}"),
            Self::Missing => write!(f, "{MISSING_RATE_LIMIT_KEY}"),
            Self::Unrestricted => write!(f, "<unrestricted>"),
        }
    }
}

/// Where a rate-limited route finds the identity of the caller.
///
/// Accepts `claim:Name`, `header:Name` and `IPs:[N;]ip1;ip2;...`, bare or
/// wrapped in braces. Anything else is a static key shared by all callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitKeySource {
    Static(String),
    Header(String),
    Claim(String),
    TrustedIps {
        /// How many `X-Forwarded-For` hops from the right are trusted proxies
        max_trusted_index: usize,
        allowed: BTreeSet<IpAddr>,
    },
}

impl RateLimitKeySource {
    pub fn resolve(&self, request: &GatewayRequest<'_>) -> RateLimitKey {
        match self {
            Self::Static(key) => RateLimitKey::Identity(key.clone()),
            Self::Header(name) => identity_or_missing(request.header(name).map(str::to_string)),
            Self::Claim(name) => identity_or_missing(
                request
                    .bearer_token()
                    .map(claim_resolver::claims)
                    .and_then(|claims| claims.get(name).and_then(claim_resolver::claim_as_string)),
            ),
            Self::TrustedIps {
                max_trusted_index,
                allowed,
            } => match client_address::resolve_client_ip(request, *max_trusted_index) {
                Some(ip) if allowed.contains(&ip) => RateLimitKey::Identity(ip.to_string()),
                Some(ip) => {
                    debug!("Client {} is not on the rate limit allow-list", ip);
                    RateLimitKey::Unrestricted
                }
                None => RateLimitKey::Unrestricted,
            },
        }
    }
}

fn identity_or_missing(identity: Option<String>) -> RateLimitKey {
    match identity {
        Some(identity) if !identity.trim().is_empty() => RateLimitKey::Identity(identity),
        _ => RateLimitKey::Missing,
    }
}

impl FromStr for RateLimitKeySource {
    type Err = AuthError;

    #[track_caller]
    fn from_str(value: &str) -> AuthErrorResult<Self> {
        let caller = Location::caller();
        let invalid = |message: String| AuthError::InvalidKeyLocation {
            value: value.to_string(),
            message,
            location: ErrorLocation::from(caller),
        };

        let (source_type, source) = match split_indirection(value, caller)? {
            Some(parts) => parts,
            None => match value.trim().split_once(':') {
                Some((source_type, source))
                    if matches!(source_type, "claim" | "header" | "IPs") =>
                {
                    (source_type, source.trim())
                }
                _ => return Ok(Self::Static(value.trim().to_string())),
            },
        };

        if source.is_empty() {
            return Err(invalid("source name must not be empty".to_string()));
        }

        match source_type {
            "claim" => Ok(Self::Claim(source.to_string())),
            "header" => Ok(Self::Header(source.to_string())),
            "IPs" => parse_trusted_ips(source).map_err(invalid),
            other => Err(invalid(format!(
                "unknown source type '{other}', expected 'claim', 'header' or 'IPs'"
            ))),
        }
    }
}

/// `[N;]ip1;ip2;...`
fn parse_trusted_ips(source: &str) -> Result<RateLimitKeySource, String> {
    let mut tokens = source
        .split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .peekable();

    let mut max_trusted_index = DEFAULT_MAX_TRUSTED_INDEX;
    if let Some(index) = tokens.peek().and_then(|token| token.parse::<i64>().ok()) {
        tokens.next();
        if index > 0 {
            max_trusted_index = usize::try_from(index).unwrap_or(DEFAULT_MAX_TRUSTED_INDEX);
        }
    }

    let allowed = tokens
        .map(|token| {
            token
                .parse::<IpAddr>()
                .map_err(|e| format!("invalid IP address '{token}': {e}"))
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    if allowed.is_empty() {
        return Err("IPs requires at least one address".to_string());
    }

    Ok(RateLimitKeySource::TrustedIps {
        max_trusted_index,
        allowed,
    })
}
