//! Per-route middleware: authorization first, then rate limiting.

use crate::RouteGuard;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use gw_auth::{AuthDecision, DenyReason, GatewayRequest, RateLimitOutcome};
use http::{HeaderValue, StatusCode, header};
use log::debug;

/// Milliseconds until the caller may retry
pub const RETRY_IN_HEADER: &str = "x-retry-in";
/// Tokens left in the caller's bucket
pub const REMAINING_HEADER: &str = "x-remaining";

const BEARER_CHALLENGE: &str = r#"Bearer realm="gateway", error="invalid_token""#;

pub async fn guard(
    State(route): State<Arc<RouteGuard>>,
    mut request: Request,
    next: Next,
) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    if let Some(auth) = &route.auth {
        let decision = {
            let gateway_request =
                GatewayRequest::new(request.headers()).with_remote_addr(remote_addr);
            route.authorizer.authorize(&gateway_request, auth)
        };

        match decision {
            AuthDecision::Allow(principal) => {
                request.extensions_mut().insert(principal);
            }
            AuthDecision::Deny(reason) => {
                debug!("Route '{}' denied request: {}", route.route_id, reason.as_str());
                return auth_denied(reason);
            }
        }
    }

    let Some(limiter) = &route.rate_limiter else {
        return next.run(request).await;
    };

    let key = {
        let gateway_request = GatewayRequest::new(request.headers()).with_remote_addr(remote_addr);
        limiter.config().key_location.resolve(&gateway_request)
    };

    let outcome = limiter.consume(&key).await;
    if !outcome.allowed {
        debug!(
            "Route '{}' rate limited '{}', retry in {}ms",
            route.route_id, key, outcome.retry_after_ms
        );
        return rate_limited(&outcome);
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(REMAINING_HEADER, HeaderValue::from(outcome.remaining_tokens));
    response
}

fn auth_denied(reason: DenyReason) -> Response {
    if reason.is_forbidden() {
        return StatusCode::FORBIDDEN.into_response();
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, BEARER_CHALLENGE)],
    )
        .into_response()
}

fn rate_limited(outcome: &RateLimitOutcome) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(RETRY_IN_HEADER, outcome.retry_after_ms.to_string())],
    )
        .into_response()
}
