use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use std::io::ErrorKind;
use std::path::{Component, Path};
use tokio_util::io::ReaderStream;

use crate::error::AppError;
use crate::state::AppState;

/// Serve staged and promoted files as static content. Staged files
/// are transient, so they are marked uncacheable; promoted files get
/// a long-lived cache header.
pub async fn serve_media(
    State(state): State<AppState>,
    UrlPath(file_path): UrlPath<String>,
) -> Result<axum::response::Response, AppError> {
    let rel_path = validate_relative_path(&file_path)?;

    let disk_path = state.store.uploads_root().join(&rel_path);
    ensure_within_root(state.store.uploads_root(), &disk_path)?;

    let file = match tokio::fs::File::open(&disk_path).await {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("No such media: {}", rel_path)));
        }
        Err(e) => return Err(e.into()),
    };

    let meta = file.metadata().await?;
    if meta.is_dir() {
        return Err(AppError::NotFound(format!("No such media: {}", rel_path)));
    }

    let mime_type = mime_guess::from_path(&disk_path).first_or_octet_stream();
    let cache_control = if rel_path.starts_with("tmp/") {
        "no-store"
    } else {
        "public, max-age=31536000"
    };

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let response = axum::response::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type.as_ref())
        .header(header::CONTENT_LENGTH, meta.len().to_string())
        .header(header::CACHE_CONTROL, cache_control)
        .body(body)
        .unwrap();

    Ok(response)
}

/// Validate and normalize a relative media path.
/// Rejects path traversal attempts and returns a clean relative path.
fn validate_relative_path(rel_path: &str) -> Result<String, AppError> {
    if rel_path.is_empty() {
        return Err(AppError::BadRequest("Empty path".into()));
    }

    let path = Path::new(rel_path);
    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(AppError::Forbidden("Path traversal not allowed".into()));
            }
            Component::Normal(s) => {
                if s.to_string_lossy().contains('\0') {
                    return Err(AppError::BadRequest(
                        "Null bytes not allowed in path".into(),
                    ));
                }
            }
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }

    let clean: std::path::PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();

    let result = clean.to_string_lossy().to_string();
    if result.is_empty() {
        return Err(AppError::BadRequest("Path resolves to empty".into()));
    }

    Ok(result.replace('\\', "/"))
}

/// Validate that a resolved path stays within the uploads root.
/// Catches symlink escapes that component validation cannot see.
fn ensure_within_root(root: &Path, resolved: &Path) -> Result<(), AppError> {
    let canon_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let canon_resolved = match resolved.canonicalize() {
        Ok(p) => p,
        // Nonexistent paths 404 at open time.
        Err(_) => return Ok(()),
    };

    if !canon_resolved.starts_with(&canon_root) {
        return Err(AppError::Forbidden("Path escapes uploads root".into()));
    }
    Ok(())
}
