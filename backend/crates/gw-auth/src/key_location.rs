use crate::{AuthError, GatewayRequest, Result as AuthErrorResult, claim_resolver};

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;

/// Where a route finds the id of the key that signed the bearer token.
///
/// Written as a literal key id, `{header:Name}` or `{claim:Name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLocation {
    Static(String),
    Header(String),
    Claim(String),
}

impl KeyLocation {
    /// Key id for this request, if it can be found
    pub fn resolve(&self, request: &GatewayRequest<'_>) -> Option<String> {
        let resolved = match self {
            Self::Static(key_id) => Some(key_id.clone()),
            Self::Header(name) => request.header(name).map(str::to_string),
            Self::Claim(name) => request
                .bearer_token()
                .and_then(|token| claim_resolver::claim_value(token, name))
                .and_then(|value| claim_resolver::claim_as_string(&value)),
        };

        resolved.filter(|key_id| !key_id.trim().is_empty())
    }
}

impl FromStr for KeyLocation {
    type Err = AuthError;

    #[track_caller]
    fn from_str(value: &str) -> AuthErrorResult<Self> {
        let caller = Location::caller();
        match split_indirection(value, caller)? {
            None => Ok(Self::Static(value.trim().to_string())),
            Some(("header", name)) => Ok(Self::Header(name.to_string())),
            Some(("claim", name)) => Ok(Self::Claim(name.to_string())),
            Some((source_type, _)) => Err(AuthError::InvalidKeyLocation {
                value: value.to_string(),
                message: format!(
                    "unknown source type '{source_type}', expected 'header' or 'claim'"
                ),
                location: ErrorLocation::from(caller),
            }),
        }
    }
}

impl fmt::Display for KeyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(key_id) => write!(f, "{key_id}"),
            Self::Header(name) => write!(f, "{{header:{name}}}"),
            Self::Claim(name) => write!(f, "{{claim:{name}}}"),
        }
    }
}

/// Split `{sourceType:source}` into its parts.
///
/// `Ok(None)` for a literal; errors for an empty value, unbalanced braces, a
/// missing `:` or an empty source.
pub(crate) fn split_indirection<'v>(
    value: &'v str,
    caller: &'static Location<'static>,
) -> AuthErrorResult<Option<(&'v str, &'v str)>> {
    let invalid = |message: &str| AuthError::InvalidKeyLocation {
        value: value.to_string(),
        message: message.to_string(),
        location: ErrorLocation::from(caller),
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid("key location must not be empty"));
    }

    let Some(rest) = trimmed.strip_prefix('{') else {
        return Ok(None);
    };
    let inner = rest
        .strip_suffix('}')
        .ok_or_else(|| invalid("missing closing '}'"))?;
    let (source_type, source) = inner
        .split_once(':')
        .ok_or_else(|| invalid("expected '{sourceType:source}'"))?;

    let source = source.trim();
    if source.is_empty() {
        return Err(invalid("source name must not be empty"));
    }

    Ok(Some((source_type.trim(), source)))
}
