//! Geometry from native pixel space to display space.
use crate::detection::types::{BoundingBox, DisplayBox, ImageDimensions, ScaledBox};

/// Height reserved above a box for its label, in layout points.
pub const LABEL_HEIGHT: f64 = 20.0;

/// Fit the image to `container_width`, keeping its aspect ratio.
///
/// Falls back to a `container_width` square while the image has not been
/// measured yet (or reports a zero side).
pub fn compute_display_box(dimensions: Option<ImageDimensions>, container_width: f64) -> DisplayBox {
    match dimensions {
        Some(dims) if dims.is_measured() => DisplayBox {
            width: container_width,
            height: container_width / dims.aspect_ratio(),
        },
        _ => DisplayBox {
            width: container_width,
            height: container_width,
        },
    }
}

/// Map a native-space box into `display`. Malformed boxes pass through.
pub fn scale_bounding_box(bbox: &BoundingBox, image: &ImageDimensions, display: &DisplayBox) -> ScaledBox {
    let scale_x = display.width / image.width;
    let scale_y = display.height / image.height;
    ScaledBox {
        x: bbox.x1 * scale_x,
        y: bbox.y1 * scale_y,
        width: (bbox.x2 - bbox.x1) * scale_x,
        height: (bbox.y2 - bbox.y1) * scale_y,
    }
}

/// Top-left point for a box's label: just above the box, or on its top edge
/// when there is no room above.
pub fn label_anchor(scaled: &ScaledBox) -> (f64, f64) {
    let y = scaled.y - LABEL_HEIGHT;
    if y < 0.0 {
        (scaled.x, scaled.y)
    } else {
        (scaled.x, y)
    }
}
