use crate::error::AppError;
use crate::models::upload::StagedUpload;
use crate::staging::reference::TEMP_PREFIX;
use crate::staging::store::next_staged_filename;
use crate::state::AppState;
use tokio::io::AsyncWriteExt;

/// Content types accepted at intake. Everything else is rejected
/// before any byte reaches the staging directory.
pub const ALLOWED_CONTENT_TYPES: [&str; 8] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-matroska",
];

/// Declared multipart content type wins; otherwise guess from the
/// client filename.
pub fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    match declared {
        Some(ct) if !ct.trim().is_empty() => ct.to_string(),
        _ => mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string(),
    }
}

fn validate_content_type(content_type: &str) -> Result<(), AppError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(AppError::UnsupportedMediaType(format!(
            "Content type '{}' is not accepted; expected one of: {}",
            content_type,
            ALLOWED_CONTENT_TYPES.join(", ")
        )))
    }
}

/// Validate and write an inbound file into the staging directory,
/// returning its temporary public URL. Validation happens before the
/// write, so a rejected upload leaves nothing behind.
pub async fn stage_upload(
    state: &AppState,
    original_name: &str,
    content_type: &str,
    data: bytes::Bytes,
) -> Result<StagedUpload, AppError> {
    validate_content_type(content_type)?;

    let size_bytes = data.len() as u64;
    if size_bytes > state.config.max_upload_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size {} exceeds max upload size {}",
            size_bytes, state.config.max_upload_size
        )));
    }

    state.store.ensure_directories().await?;

    let filename = next_staged_filename(original_name);
    let path = state.store.staged_path(&filename);
    let mut file = tokio::fs::File::create(&path).await?;
    file.write_all(&data).await?;
    file.flush().await?;

    Ok(StagedUpload {
        url: format!("{}{}", TEMP_PREFIX, filename),
        filename,
        size_bytes,
        content_type: content_type.to_string(),
    })
}
