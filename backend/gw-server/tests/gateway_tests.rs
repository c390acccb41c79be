//! Integration tests for the guarded gateway routes
mod common;

use crate::common::{
    ACME_SECRET, GLOBEX_SECRET, TRUSTED_IP, body_json, claims, create_test_app,
    create_test_state, get, header_value, hmac_token, key_file,
};

use gw_server::{REMAINING_HEADER, RETRY_IN_HEADER, build_router};

use axum::http::{StatusCode, header};
use googletest::assert_that;
use googletest::prelude::{contains_substring, eq, none, some};
use tower::ServiceExt;

#[tokio::test]
async fn given_keys_loaded_when_health_checked_then_reports_counts() {
    let app = create_test_app();

    let response = app.oneshot(get("/health", None, &[], None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["components"]["key_store"]["keys"], 2);
    assert_eq!(json["components"]["routes"], 3);
}

#[tokio::test]
async fn given_no_keys_when_readiness_checked_then_unavailable() {
    let empty = build_router(create_test_state(""));
    let loaded = create_test_app();

    let not_ready = empty.oneshot(get("/ready", None, &[], None)).await.unwrap();
    let ready = loaded.oneshot(get("/ready", None, &[], None)).await.unwrap();

    assert_eq!(not_ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn given_no_token_when_requesting_guarded_route_then_unauthorized_with_challenge() {
    let app = create_test_app();

    let response = app
        .oneshot(get("/orders", None, &[("X-Api-Key", "k1")], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_that!(
        header_value(&response, header::WWW_AUTHENTICATE.as_str()),
        some(contains_substring("Bearer"))
    );
}

#[tokio::test]
async fn given_valid_token_when_requesting_then_principal_forwarded_with_remaining() {
    let app = create_test_app();
    let token = hmac_token(&claims("acme", &["orders:read"]), ACME_SECRET);

    let response = app
        .oneshot(get("/orders", Some(&token), &[("X-Api-Key", "k1")], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_that!(header_value(&response, REMAINING_HEADER), some(eq("1")));
    let json = body_json(response).await;
    assert_eq!(json["route"], "orders");
    assert_eq!(json["key_id"], "acme");
    assert_eq!(json["subject"], "user-1");
    assert_eq!(json["roles"], serde_json::json!(["orders:read"]));
}

#[tokio::test]
async fn given_nested_path_when_requesting_then_same_guard_applies() {
    let app = create_test_app();
    let token = hmac_token(&claims("acme", &["orders:read"]), ACME_SECRET);

    let anonymous = app
        .clone()
        .oneshot(get("/orders/42/items", None, &[("X-Api-Key", "k1")], None))
        .await
        .unwrap();
    let authorized = app
        .oneshot(get("/orders/42/items", Some(&token), &[("X-Api-Key", "k1")], None))
        .await
        .unwrap();

    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(authorized.status(), StatusCode::OK);
    let json = body_json(authorized).await;
    assert_eq!(json["path"], "/orders/42/items");
}

#[tokio::test]
async fn given_token_signed_by_other_tenant_when_requesting_then_unauthorized() {
    let app = create_test_app();
    // Claims name acme but the signature is globex's
    let token = hmac_token(&claims("acme", &["orders:read"]), GLOBEX_SECRET);

    let response = app
        .oneshot(get("/orders", Some(&token), &[("X-Api-Key", "k1")], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn given_unknown_tenant_when_requesting_then_unauthorized() {
    let app = create_test_app();
    let token = hmac_token(&claims("initech", &["orders:read"]), ACME_SECRET);

    let response = app
        .oneshot(get("/orders", Some(&token), &[("X-Api-Key", "k1")], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn given_token_without_required_role_when_requesting_then_forbidden() {
    let app = create_test_app();
    let token = hmac_token(&claims("acme", &["billing"]), ACME_SECRET);

    let response = app
        .oneshot(get("/orders", Some(&token), &[("X-Api-Key", "k1")], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_that!(header_value(&response, header::WWW_AUTHENTICATE.as_str()), none());
}

#[tokio::test]
async fn given_expired_token_when_requesting_then_unauthorized() {
    let app = create_test_app();
    let mut expired = claims("acme", &[]);
    expired["exp"] = serde_json::json!(chrono::Utc::now().timestamp() - 10);
    let token = hmac_token(&expired, ACME_SECRET);

    let response = app
        .oneshot(get("/reports", Some(&token), &[], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn given_static_key_route_when_requesting_then_allowed_without_roles() {
    let app = create_test_app();
    let token = hmac_token(&claims("ignored", &[]), ACME_SECRET);

    let response = app
        .oneshot(get("/reports", Some(&token), &[], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_that!(header_value(&response, REMAINING_HEADER), none());
}

#[tokio::test]
async fn given_limit_exhausted_when_requesting_then_too_many_requests_with_retry() {
    let app = create_test_app();
    let token = hmac_token(&claims("acme", &["orders:read"]), ACME_SECRET);
    let request = || get("/orders", Some(&token), &[("X-Api-Key", "k1")], None);

    let first = app.clone().oneshot(request()).await.unwrap();
    let second = app.clone().oneshot(request()).await.unwrap();
    let third = app.clone().oneshot(request()).await.unwrap();

    assert_that!(header_value(&first, REMAINING_HEADER), some(eq("1")));
    assert_that!(header_value(&second, REMAINING_HEADER), some(eq("0")));
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_in: u64 = header_value(&third, RETRY_IN_HEADER)
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_in > 0 && retry_in <= 30_000, "retry_in = {retry_in}");

    // Another API key has its own bucket
    let other = app
        .oneshot(get("/orders", Some(&token), &[("X-Api-Key", "k2")], None))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn given_missing_rate_limit_header_when_requesting_then_denied_for_full_window() {
    let app = create_test_app();
    let token = hmac_token(&claims("acme", &["orders:read"]), ACME_SECRET);

    let response = app
        .oneshot(get("/orders", Some(&token), &[], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_that!(header_value(&response, RETRY_IN_HEADER), some(eq("60000")));
}

#[tokio::test]
async fn given_unauthorized_request_when_rate_limited_route_then_no_token_consumed() {
    let app = create_test_app();
    let token = hmac_token(&claims("acme", &["orders:read"]), ACME_SECRET);

    for _ in 0..3 {
        let denied = app
            .clone()
            .oneshot(get("/orders", None, &[("X-Api-Key", "k1")], None))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .oneshot(get("/orders", Some(&token), &[("X-Api-Key", "k1")], None))
        .await
        .unwrap();
    assert_that!(header_value(&response, REMAINING_HEADER), some(eq("1")));
}

#[tokio::test]
async fn given_trusted_peer_when_limit_exceeded_then_too_many_requests() {
    let app = create_test_app();

    let first = app
        .clone()
        .oneshot(get("/public", None, &[], Some(TRUSTED_IP)))
        .await
        .unwrap();
    let second = app
        .oneshot(get("/public", None, &[], Some(TRUSTED_IP)))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn given_peer_outside_allow_list_when_requesting_then_never_limited() {
    let app = create_test_app();

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get("/public", None, &[], Some("198.51.100.1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_that!(header_value(&response, REMAINING_HEADER), some(eq("1")));
    }
}

#[tokio::test]
async fn given_forwarded_for_header_when_requesting_then_client_address_used() {
    let app = create_test_app();
    let forwarded = [("X-Forwarded-For", TRUSTED_IP)];

    let first = app
        .clone()
        .oneshot(get("/public", None, &forwarded, Some("10.0.0.1")))
        .await
        .unwrap();
    let second = app
        .oneshot(get("/public", None, &forwarded, Some("10.0.0.2")))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn given_unconfigured_path_when_requesting_then_not_found() {
    let app = build_router(create_test_state(&key_file()));

    let response = app
        .oneshot(get("/ordersextra", None, &[], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
