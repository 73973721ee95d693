use crate::error::AppError;
use crate::staging::reference::{self, PUBLIC_PREFIX};
use crate::staging::store::{safe_basename, UploadStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Outcome of a promotion attempt. `promoted_path` is set only when a
/// staged file was actually moved during this call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub url: String,
    pub promoted_path: Option<PathBuf>,
}

impl Promotion {
    fn pass_through(reference: &str) -> Self {
        Self {
            url: reference.to_string(),
            promoted_path: None,
        }
    }
}

fn published_url(original: &str, filename: &str) -> String {
    format!(
        "{}{}{}",
        reference::origin(original),
        PUBLIC_PREFIX,
        filename
    )
}

/// Move a staged upload into permanent storage and rewrite its URL.
///
/// Non-temp references pass through untouched. A reference whose
/// staged file is gone resolves to "already promoted" when the
/// permanent copy exists, otherwise to an unchanged pass-through.
/// The move is a rename; the staged file ceases to exist on success.
pub async fn promote(store: &UploadStore, upload_ref: &str) -> Result<Promotion, AppError> {
    if !reference::is_temp_upload(upload_ref) {
        return Ok(Promotion::pass_through(upload_ref));
    }

    let pathname = reference::extract_pathname(upload_ref);
    let Some(filename) = safe_basename(&pathname) else {
        return Ok(Promotion::pass_through(upload_ref));
    };

    store.ensure_directories().await?;
    let temp_path = store.staged_path(filename);
    let target_path = store.published_path(filename);

    if !temp_path.exists() {
        if target_path.exists() {
            return Ok(Promotion {
                url: published_url(upload_ref, filename),
                promoted_path: None,
            });
        }
        return Ok(Promotion::pass_through(upload_ref));
    }

    tokio::fs::rename(&temp_path, &target_path).await?;

    Ok(Promotion {
        url: published_url(upload_ref, filename),
        promoted_path: Some(target_path),
    })
}

/// Delete the staged file behind a temp reference.
///
/// Returns `false` without touching the filesystem for non-temp
/// references. An already-missing staged file counts as removed.
pub async fn remove_temp_reference(
    store: &UploadStore,
    upload_ref: &str,
) -> Result<bool, AppError> {
    if !reference::is_temp_upload(upload_ref) {
        return Ok(false);
    }

    let pathname = reference::extract_pathname(upload_ref);
    let Some(filename) = safe_basename(&pathname) else {
        return Ok(false);
    };

    match tokio::fs::remove_file(store.staged_path(filename)).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Delete a file, swallowing "not found". No-op for empty paths.
pub async fn remove_file_if_exists(path: &Path) -> Result<(), AppError> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
