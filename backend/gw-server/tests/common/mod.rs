#![allow(dead_code)]

//! Test infrastructure for gw-server gateway tests

use gw_auth::{KeyStore, RateLimiterFactory};
use gw_config::{RouteAuthSettings, RouteConfig, RouteRateLimitSettings};
use gw_server::{GatewayState, build_router};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

pub const ACME_SECRET: &str = "acme-secret-key-at-least-32-bytes!";
pub const GLOBEX_SECRET: &str = "globex-secret-key-at-least-32-bytes";

pub const TRUSTED_IP: &str = "203.0.113.7";

/// Key file with two HMAC tenants
pub fn key_file() -> String {
    format!("acme,HS256,{ACME_SECRET}\nglobex,HS256,{GLOBEX_SECRET}\n")
}

/// Routes exercised by the tests:
///
/// - `/orders`: key id from the `org_id` claim, needs `orders:read`, 2 requests
///   per minute per `X-Api-Key`
/// - `/public`: no auth, 1 request per minute for the trusted address
/// - `/reports`: always verified with the `acme` key
pub fn test_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            id: "orders".to_string(),
            path: "/orders".to_string(),
            auth: Some(RouteAuthSettings {
                key_location: "{claim:org_id}".to_string(),
                roles_claim: "roles".to_string(),
                required_roles: vec!["orders:read".to_string()],
            }),
            rate_limit: Some(RouteRateLimitSettings {
                limit: 2,
                window_secs: 60,
                key_location: "{header:X-Api-Key}".to_string(),
            }),
        },
        RouteConfig {
            id: "public".to_string(),
            path: "/public".to_string(),
            auth: None,
            rate_limit: Some(RouteRateLimitSettings {
                limit: 1,
                window_secs: 60,
                key_location: format!("IPs:{TRUSTED_IP}"),
            }),
        },
        RouteConfig {
            id: "reports".to_string(),
            path: "/reports".to_string(),
            auth: Some(RouteAuthSettings {
                key_location: "acme".to_string(),
                roles_claim: "roles".to_string(),
                required_roles: Vec::new(),
            }),
            rate_limit: None,
        },
    ]
}

pub fn create_test_state(keys: &str) -> GatewayState {
    let key_store = KeyStore::new();
    key_store.replace(keys);
    GatewayState::from_routes(
        &test_routes(),
        Arc::new(key_store),
        &RateLimiterFactory::new(),
    )
    .expect("test routes are valid")
}

pub fn create_test_app() -> Router {
    build_router(create_test_state(&key_file()))
}

pub fn claims(org_id: &str, roles: &[&str]) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": "user-1",
        "org_id": org_id,
        "roles": roles,
        "iat": now,
        "exp": now + 3600,
    })
}

pub fn hmac_token(claims: &Value, secret: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encodes")
}

/// GET `uri` from `peer`, optionally with a bearer token and extra headers
pub fn get(
    uri: &str,
    token: Option<&str>,
    headers: &[(&str, &str)],
    peer: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let mut request = builder.body(Body::empty()).unwrap();
    if let Some(peer) = peer {
        let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
    }
    request
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub fn header_value(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
