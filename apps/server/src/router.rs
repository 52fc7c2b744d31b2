use axum::Router;
use axum::middleware::from_fn_with_state;
use lovebird::AppState;
use lovebird::server::{api_router, browser_session};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

/// Path of the API reference UI.
pub const DOCS_PATH: &str = "/api/docs";

#[derive(OpenApi)]
#[openapi(info(title = "Lovebird", description = "Login and self-test pages backed by a hosted identity service"))]
struct ApiDoc;

/// The complete application: feature routes, browser cookie, request tracing and API docs.
pub fn build_router(state: AppState) -> Router {
    let api = ApiDoc::openapi();
    let identity = state.identity.clone();

    // Separate the OpenAPI routes and the API documentation object
    let (openapi_routes, api_doc) = OpenApiRouter::with_openapi(api)
        .merge(api_router())
        .layer(from_fn_with_state(identity, browser_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    let scalar_routes = Scalar::with_url(DOCS_PATH, api_doc);

    Router::new().merge(openapi_routes).merge(scalar_routes)
}
