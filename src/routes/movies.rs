use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{require_catalog_admin, Identity};
use crate::error::AppError;
use crate::models::movie::{CreateMovieRequest, ListMoviesQuery, UpdateMovieRequest};
use crate::services::movie_service;
use crate::state::AppState;

pub async fn create_movie(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateMovieRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_catalog_admin(&identity)?;

    if req.title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }

    let movie = movie_service::create_movie(&state, req).await?;
    tracing::info!(movie_id = %movie.id, title = %movie.title, "Movie created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": movie, "error": null })),
    ))
}

pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<ListMoviesQuery>,
) -> Json<Value> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).min(100);

    let movies = movie_service::list_movies(&state, page, per_page, query.sort).await;

    Json(json!({
        "data": {
            "movies": movies,
            "page": page,
            "per_page": per_page,
            "total": state.movies.len(),
        },
        "error": null
    }))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let movie = movie_service::get_movie(&state, movie_id).await?;

    Ok(Json(json!({ "data": movie, "error": null })))
}

pub async fn update_movie(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(movie_id): Path<Uuid>,
    Json(req): Json<UpdateMovieRequest>,
) -> Result<Json<Value>, AppError> {
    require_catalog_admin(&identity)?;

    let movie = movie_service::update_movie(&state, movie_id, req).await?;
    tracing::info!(movie_id = %movie_id, "Movie updated");

    Ok(Json(json!({ "data": movie, "error": null })))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(movie_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_catalog_admin(&identity)?;

    movie_service::delete_movie(&state, movie_id).await?;
    tracing::info!(movie_id = %movie_id, "Movie deleted");

    Ok(StatusCode::NO_CONTENT)
}
