
use http::HeaderMap;
use http::header::{AUTHORIZATION, HeaderValue};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::Value;

pub(crate) const RSA_PRIVATE_PEM: &str = include_str!("fixtures/rsa_private.pem");
pub(crate) const RSA_PUBLIC_PEM: &str = include_str!("fixtures/rsa_public.pem");
pub(crate) const RSA_CERT_PEM: &str = include_str!("fixtures/rsa_cert.pem");
pub(crate) const OTHER_PUBLIC_PEM: &str = include_str!("fixtures/other_public.pem");

pub(crate) const HMAC_SECRET: &str = "test-secret-key-at-least-32-bytes";

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims valid for the next hour
pub(crate) fn valid_claims() -> Value {
    serde_json::json!({
        "sub": "user-123",
        "iat": now(),
        "exp": now() + 3600,
        "roles": ["user"],
    })
}

pub(crate) fn hmac_token(claims: &Value, secret: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub(crate) fn hmac_token_with_kid(claims: &Value, secret: &str, kid: &str) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

pub(crate) fn rsa_token(claims: &Value, algorithm: Algorithm) -> String {
    encode(
        &Header::new(algorithm),
        claims,
        &EncodingKey::from_rsa_pem(RSA_PRIVATE_PEM.as_bytes()).unwrap(),
    )
    .unwrap()
}

pub(crate) fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}
