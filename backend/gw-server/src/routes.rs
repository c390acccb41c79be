use crate::{GatewayState, RouteGuard, health, route_guard};

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use gw_auth::AuthenticatedPrincipal;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

/// Build the gateway router: health endpoints plus one guarded subtree per route
pub fn build_router(state: GatewayState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::liveness_check))
        .route("/ready", get(health::readiness_check))
        .with_state(state.clone());

    for guard in state.guards.iter() {
        router = router.merge(guarded_routes(Arc::clone(guard)));
    }

    router.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

/// The route's path and everything below it, behind its guard
fn guarded_routes(guard: Arc<RouteGuard>) -> Router {
    let route_id: Arc<str> = Arc::from(guard.route_id.as_str());
    let subtree = match guard.path.as_str() {
        "/" => "/{*rest}".to_string(),
        path => format!("{path}/{{*rest}}"),
    };

    Router::new()
        .route(&guard.path, any(admitted))
        .route(&subtree, any(admitted))
        .with_state(route_id)
        .layer(middleware::from_fn_with_state(guard, route_guard::guard))
}

/// Terminal handler for admitted requests: who got through, on which route
async fn admitted(State(route_id): State<Arc<str>>, request: Request) -> Response {
    let principal = request.extensions().get::<AuthenticatedPrincipal>();

    let mut roles: Vec<&str> = principal
        .map(|p| p.roles.iter().map(String::as_str).collect())
        .unwrap_or_default();
    roles.sort_unstable();

    Json(json!({
        "route": &*route_id,
        "path": request.uri().path(),
        "key_id": principal.map(|p| p.key_id.as_str()),
        "subject": principal.and_then(|p| p.subject.as_deref()),
        "roles": roles,
    }))
    .into_response()
}
