pub mod health;
pub mod media;
pub mod movies;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::BearerAuthLayer;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_size as usize;

    // Public routes (no auth): health probe and static media
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/uploads/{*file_path}", get(media::serve_media));

    // Authenticated API routes
    let api_routes = Router::new()
        .route("/status", get(health::status))
        // Uploads
        .route("/uploads", post(uploads::upload_media))
        .route("/uploads", delete(uploads::discard_upload))
        // Movies
        .route("/movies", post(movies::create_movie))
        .route("/movies", get(movies::list_movies))
        .route("/movies/{movie_id}", get(movies::get_movie))
        .route("/movies/{movie_id}", patch(movies::update_movie))
        .route("/movies/{movie_id}", delete(movies::delete_movie))
        .layer(BearerAuthLayer::new(state.tokens.clone()));

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID
    let x_request_id = http::HeaderName::from_static("x-request-id");

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
