//! HTTP API layer: system routes and the OpenAPI document.

pub mod system;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// Path the OpenAPI document is served on.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI description of the HTTP endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(system::health_handler),
    components(schemas(system::HealthResponse)),
    tags((name = "System", description = "Service health and metadata")),
)]
pub struct ApiDoc;

/// Builds the HTTP router (everything except the WebSocket route).
pub fn build_router() -> Router<AppState> {
    Router::new().merge(system::routes()).merge(docs_routes())
}

#[cfg(feature = "swagger-ui")]
fn docs_routes() -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_routes() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
