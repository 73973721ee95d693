use serde::{Deserialize, Serialize};

/// Response body for a freshly staged upload. The URL is temporary;
/// the file only becomes durable once the owning movie is saved.
#[derive(Debug, Clone, Serialize)]
pub struct StagedUpload {
    pub url: String,
    pub filename: String,
    pub size_bytes: u64,
    pub content_type: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscardUploadRequest {
    pub url: String,
}
