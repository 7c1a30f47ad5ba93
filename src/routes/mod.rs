//! HTTP routes for Gatehouse
//!
//! This module defines all HTTP endpoints exposed by the server.

pub mod debug;
pub mod docs;
pub mod health;
pub mod hello;
pub mod metrics;
pub mod session;

use std::sync::Arc;

use axum::{
    handler::Handler,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    middleware::{
        auth::require_auth,
        rate_limiter::{rate_limit, RATELIMIT_LIMIT, RATELIMIT_REMAINING, RATELIMIT_RESET},
    },
    AppState,
};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let limiters = &state.rate_limiters;
    let provider = state.auth_provider.clone();

    // Rate limiting runs before authentication, so rejected clients never
    // reach the auth provider.
    let general = || middleware::from_fn_with_state(limiters.general.clone(), rate_limit);
    let authenticated = || middleware::from_fn_with_state(provider.clone(), require_auth);

    let api_routes = Router::new()
        .route("/api/health", get(health::health_check).layer(general()))
        .route("/api/health/live", get(health::liveness_check))
        .route("/api/hello", get(hello::hello).layer(general()))
        .route(
            "/api/me",
            get(session::me.layer(ServiceBuilder::new().layer(general()).layer(authenticated()))),
        )
        .route(
            "/api/auth/session",
            post(
                session::create_session.layer(
                    ServiceBuilder::new()
                        .layer(middleware::from_fn_with_state(
                            limiters.auth.clone(),
                            rate_limit,
                        ))
                        .layer(authenticated()),
                ),
            )
            .delete(
                session::delete_session.layer(
                    ServiceBuilder::new()
                        .layer(middleware::from_fn_with_state(
                            limiters.sensitive.clone(),
                            rate_limit,
                        ))
                        .layer(authenticated()),
                ),
            ),
        )
        .route("/api/debug/ping", get(debug::ping))
        .route("/api/debug/config", get(debug::config_info));

    let public_routes = Router::new()
        .route("/", get(hello::root))
        .route("/metrics", get(metrics::prometheus_metrics))
        .merge(docs::create_docs_router::<Arc<AppState>>());

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .fallback(not_found)
        // Global middleware (applied to all routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// CORS restricted to the configured origins, with credentials
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([RATELIMIT_LIMIT, RATELIMIT_REMAINING, RATELIMIT_RESET])
        .allow_credentials(true)
}
