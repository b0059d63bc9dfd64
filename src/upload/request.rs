use std::path::PathBuf;

use serde::Serialize;

use crate::errors::{LensError, LensResult};

pub const FIELD_NAME: &str = "file";
pub const FALLBACK_FILENAME: &str = "photo.jpg";
/// Sent for every upload regardless of the picked file's real format.
pub const CONTENT_TYPE: &str = "image/jpeg";

/// Single-field multipart body describing one image upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultipartPayload {
    pub field_name: &'static str,
    pub image_uri: String,
    pub filename: String,
    pub content_type: &'static str,
}

/// Describe the upload of `image_uri`. An explicit `filename` wins; otherwise
/// the last path segment of the URI is used, then [`FALLBACK_FILENAME`].
pub fn build_detection_request(image_uri: &str, filename: Option<&str>) -> MultipartPayload {
    let filename = filename
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| infer_filename(image_uri));

    MultipartPayload {
        field_name: FIELD_NAME,
        image_uri: image_uri.to_string(),
        filename,
        content_type: CONTENT_TYPE,
    }
}

fn infer_filename(image_uri: &str) -> String {
    image_uri
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|seg| !seg.is_empty())
        .unwrap_or(FALLBACK_FILENAME)
        .to_string()
}

/// Local filesystem path behind a `file://` URI or bare path.
pub fn local_path(image_uri: &str) -> LensResult<PathBuf> {
    if let Some(rest) = image_uri.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if image_uri.contains("://") {
        return Err(LensError::Config(format!(
            "unsupported image URI scheme: {image_uri}"
        )));
    }
    if image_uri.is_empty() {
        return Err(LensError::Config("empty image URI".into()));
    }
    Ok(PathBuf::from(image_uri))
}

/// Load the bytes to upload.
pub async fn read_payload_bytes(payload: &MultipartPayload) -> LensResult<Vec<u8>> {
    let path = local_path(&payload.image_uri)?;
    let bytes = tokio::fs::read(&path).await?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "upload payload read");
    Ok(bytes)
}
