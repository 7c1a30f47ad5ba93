//! OpenAPI specification for the Gatehouse API

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    error::ErrorBody,
    routes::{
        health::{HealthResponse, LivenessResponse},
        hello::HelloResponse,
        session::SessionResponse,
    },
    supabase::Principal,
};

/// OpenAPI specification for the Gatehouse API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gatehouse API",
        version = "1.0.0",
        description = "Authenticated, rate-limited API server"
    ),
    servers((url = "/")),
    paths(
        crate::routes::hello::root,
        crate::routes::hello::hello,
        crate::routes::health::health_check,
        crate::routes::health::liveness_check,
        crate::routes::session::me,
        crate::routes::session::create_session,
        crate::routes::session::delete_session,
    ),
    components(
        schemas(
            HealthResponse,
            LivenessResponse,
            HelloResponse,
            Principal,
            SessionResponse,
            ErrorBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Testing", description = "Connectivity test endpoints"),
        (name = "Auth", description = "Authenticated endpoints")
    )
)]
pub struct ApiDoc;

/// Security scheme addon for Bearer JWT authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
