use async_trait::async_trait;

use crate::detection::types::ImageDimensions;
use crate::errors::{LensError, LensResult};
use crate::upload::request::local_path;

/// Photo library and camera, provided by the host shell.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// `None` when the user dismissed the picker.
    async fn pick_image(&self) -> LensResult<Option<String>>;

    /// Ask for camera access; `false` means the user refused.
    async fn request_camera_permission(&self) -> LensResult<bool>;

    /// `None` when the user backed out of the camera.
    async fn capture_photo(&self) -> LensResult<Option<String>>;
}

/// Measure the native pixel size of the image at `image_uri`.
///
/// Only the header is decoded; runs on the blocking pool.
pub async fn measure_image(image_uri: &str) -> LensResult<ImageDimensions> {
    let path = local_path(image_uri)?;
    let (w, h) = tokio::task::spawn_blocking(move || image::image_dimensions(&path))
        .await
        .map_err(|e| LensError::Image(format!("join: {e}")))?
        .map_err(|e| LensError::Image(format!("measure: {e}")))?;
    if w == 0 || h == 0 {
        return Err(LensError::Image(format!("image reports {w}x{h}")));
    }
    tracing::debug!(uri = %image_uri, width = w, height = h, "image measured");
    Ok(ImageDimensions::new(w as f64, h as f64))
}
