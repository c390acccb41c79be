//! Best-effort claim extraction from bearer tokens.
//!
//! Nothing in this module verifies signatures and nothing in it fails: a
//! malformed token simply yields no claims, and will be rejected separately by
//! [`TokenVerifier`](crate::TokenVerifier).

use crate::{Claims, ParsedToken};

use std::collections::HashSet;

use log::warn;
use serde_json::Value;

/// Claims of `token` without checking the signature; empty if it does not parse
pub fn claims(token: &str) -> Claims {
    ParsedToken::parse(token)
        .map(ParsedToken::into_claims)
        .unwrap_or_default()
}

/// Value of claim `name`.
///
/// When the claim is absent the `kid` header is returned instead. Some clients
/// only carry their key hint in the header, so `{claim:...}` key lookups fall
/// back to it. This is not a general claim resolution rule.
pub fn claim_value(token: &str, name: &str) -> Option<Value> {
    let parsed = ParsedToken::parse(token)?;
    if let Some(value) = parsed.claims().get(name) {
        return Some(value.clone());
    }
    parsed.key_id().map(|kid| Value::String(kid.to_string()))
}

/// Single string form of a claim value.
///
/// Strings pass through; for arrays the first element wins. Other types
/// have no string form.
pub fn claim_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            if items.len() > 1 {
                warn!(
                    "Claim has {} values, using the first and discarding the rest",
                    items.len()
                );
            }
            items.first().and_then(scalar_to_string)
        }
        _ => None,
    }
}

/// List form of a claim value.
///
/// Comma separated strings are split and trimmed, arrays pass through, and
/// numbers become a single entry.
pub fn claim_as_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if s.contains(',') => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

/// Resolve a dotted path such as `realm_access.roles` through nested objects.
///
/// Every segment but the last must name an object. The leaf contributes its
/// string, or the strings of its array. Anything else resolves to nothing.
pub fn resolve_dotted_path(claims: &Claims, path: &str) -> HashSet<String> {
    let mut segments = path.split('.').peekable();
    let mut current = claims.as_map();

    while let Some(segment) = segments.next() {
        let Some(value) = current.get(segment) else {
            return HashSet::new();
        };

        if segments.peek().is_none() {
            return match value {
                Value::String(s) => HashSet::from([s.clone()]),
                Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
                _ => HashSet::new(),
            };
        }

        match value {
            Value::Object(nested) => current = nested,
            _ => return HashSet::new(),
        }
    }

    HashSet::new()
}

/// Roles found at `path` in the token claims, unioned with the same path in
/// the principal's user info claims when present
pub fn roles_from_claim(claims: &Claims, path: &str, user_info: Option<&Claims>) -> HashSet<String> {
    let mut roles = resolve_dotted_path(claims, path);
    if let Some(user_info) = user_info {
        roles.extend(resolve_dotted_path(user_info, path));
    }
    roles
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
