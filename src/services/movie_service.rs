use crate::error::AppError;
use crate::models::movie::{CreateMovieRequest, MovieMeta, UpdateMovieRequest};
use crate::staging::gateway;
use crate::staging::reference::{self, PUBLIC_PREFIX};
use crate::staging::store::safe_basename;
use crate::state::AppState;
use chrono::Utc;
use uuid::Uuid;

/// Promote an upload reference attached to a movie field. Empty
/// strings are treated as "no upload".
async fn attach_upload(
    state: &AppState,
    upload_ref: Option<String>,
) -> Result<Option<String>, AppError> {
    match upload_ref {
        Some(r) if !r.is_empty() => {
            let promotion = gateway::promote(&state.store, &r).await?;
            if let Some(path) = &promotion.promoted_path {
                tracing::debug!(path = %path.display(), "Staged upload promoted");
            }
            Ok(Some(promotion.url))
        }
        _ => Ok(None),
    }
}

/// Delete the file behind a reference this server owns: staged files
/// go through the temp gateway, promoted files are unlinked from the
/// permanent directory. Foreign URLs are left alone.
async fn cleanup_reference(state: &AppState, upload_ref: &str) -> Result<(), AppError> {
    if reference::is_temp_upload(upload_ref) {
        gateway::remove_temp_reference(&state.store, upload_ref).await?;
        return Ok(());
    }

    // Promoted files are direct children of the uploads root.
    let pathname = reference::extract_pathname(upload_ref);
    if let Some(filename) = pathname.strip_prefix(PUBLIC_PREFIX) {
        if safe_basename(filename) == Some(filename) {
            gateway::remove_file_if_exists(&state.store.published_path(filename)).await?;
        }
    }
    Ok(())
}

pub async fn create_movie(
    state: &AppState,
    req: CreateMovieRequest,
) -> Result<MovieMeta, AppError> {
    let now = Utc::now();
    let id = Uuid::new_v4();

    let poster_url = attach_upload(state, req.poster_url).await?;
    let video_url = attach_upload(state, req.video_url).await?;

    let movie = MovieMeta {
        id,
        title: req.title,
        description: req.description.unwrap_or_default(),
        poster_url,
        video_url,
        created_at: now,
        updated_at: now,
    };

    state.movies.insert(id, movie.clone());
    Ok(movie)
}

pub async fn get_movie(state: &AppState, movie_id: Uuid) -> Result<MovieMeta, AppError> {
    state
        .movies
        .get(&movie_id)
        .map(|m| m.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))
}

pub async fn list_movies(
    state: &AppState,
    page: u64,
    per_page: u64,
    sort: Option<String>,
) -> Vec<MovieMeta> {
    let mut movies: Vec<MovieMeta> = state.movies.iter().map(|m| m.value().clone()).collect();

    match sort.as_deref() {
        Some("title") => movies.sort_by(|a, b| a.title.cmp(&b.title)),
        _ => movies.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    let start = ((page - 1) * per_page) as usize;
    movies
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect()
}

pub async fn update_movie(
    state: &AppState,
    movie_id: Uuid,
    req: UpdateMovieRequest,
) -> Result<MovieMeta, AppError> {
    if !state.movies.contains_key(&movie_id) {
        return Err(AppError::NotFound(format!("Movie {} not found", movie_id)));
    }

    // Promote replacements before taking the map guard; no awaits may
    // happen while a DashMap entry is held.
    let poster_change = match req.poster_url {
        Some(r) => Some(attach_upload(state, Some(r)).await?),
        None => None,
    };
    let video_change = match req.video_url {
        Some(r) => Some(attach_upload(state, Some(r)).await?),
        None => None,
    };

    let mut replaced: Vec<String> = Vec::new();
    let updated = {
        let mut entry = state
            .movies
            .get_mut(&movie_id)
            .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;
        let movie = entry.value_mut();

        if let Some(title) = req.title {
            movie.title = title;
        }
        if let Some(description) = req.description {
            movie.description = description;
        }
        if let Some(poster) = poster_change {
            if movie.poster_url != poster {
                if let Some(old) = movie.poster_url.take() {
                    replaced.push(old);
                }
                movie.poster_url = poster;
            }
        }
        if let Some(video) = video_change {
            if movie.video_url != video {
                if let Some(old) = movie.video_url.take() {
                    replaced.push(old);
                }
                movie.video_url = video;
            }
        }
        movie.updated_at = Utc::now();
        movie.clone()
    };

    for old in replaced {
        cleanup_reference(state, &old).await?;
    }

    Ok(updated)
}

pub async fn delete_movie(state: &AppState, movie_id: Uuid) -> Result<(), AppError> {
    let (_, movie) = state
        .movies
        .remove(&movie_id)
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;

    if let Some(poster) = &movie.poster_url {
        cleanup_reference(state, poster).await?;
    }
    if let Some(video) = &movie.video_url {
        cleanup_reference(state, video).await?;
    }

    Ok(())
}
