pub mod auth;
pub mod countries;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::routes::auth::ServerState;

// Multipart flag uploads must clear the 2048 KB validation limit so oversized
// files fail with a 422 rather than a transport-level 413.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: countries resource, auth, flag file
/// service, and API docs.
pub fn build_router(storage_root: &str, cors: CorsLayer, state: ServerState) -> Router {
    // Public flag files resolve under /storage.
    let storage_dir = ServeDir::new(storage_root);

    let public = Router::new()
        .route("/health", get(health))
        .route("/countries", get(countries::list).post(countries::create))
        .route(
            "/countries/:id",
            get(countries::show)
                .put(countries::update)
                .patch(countries::update)
                .delete(countries::destroy),
        )
        .route(
            "/countries/:id/flag",
            get(countries::get_flag).post(countries::update_flag),
        )
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Session-holder routes
    let protected = Router::new()
        .route("/user", get(auth::me))
        .route("/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/storage", storage_dir)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
