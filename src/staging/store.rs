use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Filesystem layout for uploaded media: a permanent root and a
/// staging directory beneath it. Both paths are injected at
/// construction; nothing is read from process-wide state.
#[derive(Debug, Clone)]
pub struct UploadStore {
    uploads_root: PathBuf,
    temp_dir: PathBuf,
}

impl UploadStore {
    pub fn new(uploads_root: impl Into<PathBuf>) -> Self {
        let uploads_root = uploads_root.into();
        let temp_dir = uploads_root.join("tmp");
        Self {
            uploads_root,
            temp_dir,
        }
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Create the permanent and staging directories if absent.
    /// Idempotent and safe under concurrent callers: an already
    /// existing directory counts as success.
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.uploads_root).await?;
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        Ok(())
    }

    pub fn staged_path(&self, filename: &str) -> PathBuf {
        self.temp_dir.join(filename)
    }

    pub fn published_path(&self, filename: &str) -> PathBuf {
        self.uploads_root.join(filename)
    }
}

/// Generate a fresh staged filename: `<unix-millis>-<suffix>.<ext>`,
/// keeping the (lowercased) extension of the client's filename.
/// Uniqueness is probabilistic; names are never reused in practice.
pub fn next_staged_filename(original: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let stamp = Utc::now().timestamp_millis();

    match Path::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => {
            format!("{}-{}.{}", stamp, suffix, ext.to_ascii_lowercase())
        }
        _ => format!("{}-{}", stamp, suffix),
    }
}

/// Final segment of a URL pathname, usable as a bare filename.
/// Rejects empty segments, dot segments, NUL bytes and backslashes so
/// a crafted reference can never escape the staging directory.
pub fn safe_basename(pathname: &str) -> Option<&str> {
    let name = pathname.rsplit('/').next().unwrap_or(pathname);
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    if name.contains('\0') || name.contains('\\') {
        return None;
    }
    Some(name)
}
