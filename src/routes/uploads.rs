use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::error::AppError;
use crate::models::upload::DiscardUploadRequest;
use crate::services::upload_service;
use crate::staging::gateway;
use crate::state::AppState;

pub async fn upload_media(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "upload.bin".to_string());
        let declared = field.content_type().map(|s| s.to_string());
        let content_type = upload_service::resolve_content_type(declared.as_deref(), &original_name);

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload body: {}", e)))?;

        let staged =
            upload_service::stage_upload(&state, &original_name, &content_type, data).await?;

        tracing::info!(
            user = %identity.name,
            filename = %staged.filename,
            size = staged.size_bytes,
            content_type = %staged.content_type,
            "Upload staged"
        );

        return Ok((
            StatusCode::CREATED,
            Json(json!({ "data": staged, "error": null })),
        ));
    }

    Err(AppError::BadRequest(
        "Multipart field 'file' is required".into(),
    ))
}

/// Discard a draft upload before it was ever attached to a movie.
/// Idempotent; a non-temp URL is reported as not removed.
pub async fn discard_upload(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<DiscardUploadRequest>,
) -> Result<Json<Value>, AppError> {
    let removed = gateway::remove_temp_reference(&state.store, &req.url).await?;

    if removed {
        tracing::info!(user = %identity.name, url = %req.url, "Staged upload discarded");
    }

    Ok(Json(json!({
        "data": { "removed": removed },
        "error": null
    })))
}
