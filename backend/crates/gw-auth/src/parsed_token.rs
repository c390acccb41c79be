use crate::Claims;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

/// Unverified view of a compact JWT.
///
/// Nothing here is trusted: it exists to find the signing key and rate-limit
/// identity before (or without) signature verification.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    header: Map<String, Value>,
    claims: Claims,
    signature: Vec<u8>,
    raw_segments: [String; 3],
}

impl ParsedToken {
    /// Decode the three base64url segments; `None` if any of them is malformed
    pub fn parse(token: &str) -> Option<Self> {
        let mut segments = token.trim().split('.');
        let (header, payload, signature) =
            (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }

        let header_json = decode_object(header)?;
        let claims_json = decode_object(payload)?;
        let signature_bytes = decode_segment(signature)?;

        Some(Self {
            header: header_json,
            claims: Claims::new(claims_json),
            signature: signature_bytes,
            raw_segments: [
                header.to_string(),
                payload.to_string(),
                signature.to_string(),
            ],
        })
    }

    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    /// `kid` header parameter
    pub fn key_id(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }

    /// `alg` header parameter
    pub fn algorithm(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn into_claims(self) -> Claims {
        self.claims
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn raw_segments(&self) -> &[String; 3] {
        &self.raw_segments
    }
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .ok()
}

fn decode_object(segment: &str) -> Option<Map<String, Value>> {
    let bytes = decode_segment(segment)?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
