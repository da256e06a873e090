//! Media-type inference from artifact file extensions.

use std::path::Path;

/// Media type used when an artifact has no usable extension and must be
/// tagged as an image anyway (inline encoding).
pub const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/png";

/// Media type used for uploads whose extension is missing.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// The extension of `path` including the leading dot, or an empty
/// string when there is none.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

/// Infer an `image/*` media type from the file extension.
///
/// `jpg` is normalised to `image/jpeg`; other extensions map to
/// `image/<lowercased ext>`. Returns `None` when there is no extension.
pub fn image_media_type(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if ext.is_empty() {
        return None;
    }
    Some(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "svg" => "image/svg+xml".to_string(),
        other => format!("image/{other}"),
    })
}

/// Content type for uploading `path` to object storage.
pub fn upload_content_type(path: &Path) -> String {
    image_media_type(path).unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Media type tag for an inline `data:` reference to `path`.
pub fn inline_media_type(path: &Path) -> String {
    image_media_type(path).unwrap_or_else(|| DEFAULT_IMAGE_MEDIA_TYPE.to_string())
}
