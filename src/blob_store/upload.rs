/// Upload validation and naming
use crate::error::{LuneError, LuneResult};
use chrono::{DateTime, Utc};
use image::ImageFormat;
use uuid::Uuid;

/// Accepted photo extensions
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Lower-cased extension of `filename`, if any
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn allowed_file(filename: &str) -> bool {
    extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied file name to a safe ASCII basename
///
/// Directory components are dropped, whitespace becomes `_`, anything other
/// than ASCII letters, digits, `.`, `-` and `_` is removed, and leading dots
/// and underscores are stripped.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// Storage key: `YYYYMMDD_HHMMSS_<8 hex>_<sanitized name>`
///
/// The random fragment keeps two uploads of the same name in the same second
/// apart.
pub fn storage_key(now: DateTime<Utc>, filename: &str) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        now.format("%Y%m%d_%H%M%S"),
        &nonce[..8],
        sanitize_filename(filename)
    )
}

/// MIME type from the file's magic bytes, for the accepted formats only
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    match image::guess_format(data).ok()? {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// Check an upload and return its sniffed MIME type
pub fn validate_upload(filename: &str, data: &[u8], max_size: usize) -> LuneResult<&'static str> {
    if data.is_empty() {
        return Err(LuneError::Validation("No file selected".to_string()));
    }

    if data.len() > max_size {
        return Err(LuneError::Validation(format!(
            "File too large: {} bytes (max {})",
            data.len(),
            max_size
        )));
    }

    if !allowed_file(filename) || sanitize_filename(filename).is_empty() {
        return Err(LuneError::Validation(format!(
            "File type not allowed. Accepted formats: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    sniff_mime(data).ok_or_else(|| {
        LuneError::Validation("File content is not a supported image".to_string())
    })
}
