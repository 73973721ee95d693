use url::Url;

/// Pathname prefix of files still sitting in the staging directory.
pub const TEMP_PREFIX: &str = "/uploads/tmp/";

/// Pathname prefix of promoted files servable as static content.
pub const PUBLIC_PREFIX: &str = "/uploads/";

fn has_http_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn before_query(value: &str) -> &str {
    value.split('?').next().unwrap_or(value)
}

/// Extract the pathname component of an upload reference.
///
/// Absolute HTTP(S) URLs are parsed; anything else degrades to
/// best-effort slicing up to the first query-string delimiter.
/// Total over arbitrary input.
pub fn extract_pathname(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if has_http_scheme(value) {
        if let Ok(url) = Url::parse(value) {
            return url.path().to_string();
        }
    }
    before_query(value).to_string()
}

/// Scheme + host (+ non-default port) of an absolute URL, or empty.
pub fn origin(value: &str) -> String {
    if !has_http_scheme(value) {
        return String::new();
    }
    match Url::parse(value) {
        Ok(url) => url.origin().ascii_serialization(),
        Err(_) => String::new(),
    }
}

/// Whether the reference points into the staging directory.
pub fn is_temp_upload(value: &str) -> bool {
    extract_pathname(value).starts_with(TEMP_PREFIX)
}
