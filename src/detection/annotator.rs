//! Burn detection boxes and labels into the source image.
//!
//! For hosts that cannot stroke an overlay on top of the preview: boxes are
//! drawn in native pixel space, coloured by confidence tier, and the result
//! is returned as PNG.
use base64::Engine as _;

use crate::detection::confidence::colour_tier;
use crate::detection::overlay::overlay_label;
use crate::detection::types::Detection;
use crate::errors::{LensError, LensResult};

/// Annotate `src_bytes` (JPEG/PNG) with one rectangle per detection.
///
/// On wide images (> 1600 px) labels are drawn at 2× scale.
pub fn annotate_image(src_bytes: &[u8], detections: &[Detection]) -> LensResult<Vec<u8>> {
    let img = image::load_from_memory(src_bytes)
        .map_err(|e| LensError::Image(format!("annotate load: {e}")))?;
    let mut canvas = img.to_rgba8();
    let (w, h) = canvas.dimensions();

    let label_scale: u32 = if w > 1600 { 2 } else { 1 };
    let box_thickness: i32 = if w > 1600 { 4 } else { 2 };
    let label_h_px = (5 * label_scale + 4 * label_scale) as i32;

    // Coordinates past the margin are off-canvas; clamped so edge offsets stay in i32 range.
    let margin = f64::from(box_thickness + label_h_px);
    let to_px = |v: f64, limit: u32| -> i32 {
        if v.is_nan() {
            return 0;
        }
        v.round().clamp(-margin, f64::from(limit) + margin) as i32
    };

    for det in detections {
        let x1 = to_px(det.bbox.x1, w);
        let y1 = to_px(det.bbox.y1, h);
        let x2 = to_px(det.bbox.x2, w);
        let y2 = to_px(det.bbox.y2, h);
        let col = colour_tier(det.confidence).rgba();

        draw_rect(&mut canvas, x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2), col, box_thickness);

        draw_label(
            &mut canvas,
            x1.min(x2).max(0),
            (y1.min(y2) - label_h_px).max(0),
            &overlay_label(det),
            col,
            label_scale,
        );
    }

    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(canvas)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| LensError::Image(format!("PNG encode: {e}")))?;
    tracing::debug!(boxes = detections.len(), bytes = out.len(), "annotated image encoded");
    Ok(out)
}

/// Same as [`annotate_image`], as a `data:image/png;base64,` URI.
pub fn annotate_image_data_uri(src_bytes: &[u8], detections: &[Detection]) -> LensResult<String> {
    let png = annotate_image(src_bytes, detections)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);
    Ok(format!("data:image/png;base64,{b64}"))
}

// ── Drawing primitives ──────────────────────────────────────────────────────

fn draw_rect(
    canvas: &mut image::RgbaImage,
    x1: i32, y1: i32, x2: i32, y2: i32,
    col: [u8; 4],
    thickness: i32,
) {
    let (w, h) = canvas.dimensions();
    let (iw, ih) = (w as i32, h as i32);
    let xs = x1.max(0)..=x2.min(iw - 1);
    let ys = y1.max(0)..=y2.min(ih - 1);

    for t in 0..thickness {
        let (ty, by) = (y1 + t, y2 - t);
        for x in xs.clone() {
            if (0..ih).contains(&ty) { blend(canvas, x as u32, ty as u32, col); }
            if (0..ih).contains(&by) { blend(canvas, x as u32, by as u32, col); }
        }
        let (lx, rx) = (x1 + t, x2 - t);
        for y in ys.clone() {
            if (0..iw).contains(&lx) { blend(canvas, lx as u32, y as u32, col); }
            if (0..iw).contains(&rx) { blend(canvas, rx as u32, y as u32, col); }
        }
    }
}

/// Filled tier-coloured tag with dark glyphs.
fn draw_label(
    canvas: &mut image::RgbaImage,
    x: i32, y: i32,
    text: &str,
    col: [u8; 4],
    scale: u32,
) {
    let (w, h) = canvas.dimensions();
    let step = 5 * scale + scale;
    let pad = 2 * scale;
    let label_w = text.chars().count() as u32 * step + pad * 2;
    let label_h = 5 * scale + pad * 2;
    let (x, y) = (x as u32, y as u32);

    for dy in 0..label_h {
        for dx in 0..label_w {
            let (px, py) = (x + dx, y + dy);
            if px < w && py < h {
                blend(canvas, px, py, col);
            }
        }
    }

    let ink = [20, 20, 20, 255];
    for (i, c) in text.to_uppercase().chars().enumerate() {
        let gx = x + pad + i as u32 * step;
        if gx + 5 * scale >= w { break; }
        draw_glyph(canvas, c, gx, y + pad, ink, scale);
    }
}

fn draw_glyph(canvas: &mut image::RgbaImage, c: char, px: u32, py: u32, col: [u8; 4], scale: u32) {
    let glyph = match c {
        '0'..='9' => FONT[(c as u8 - b'0') as usize],
        'A'..='Z' => FONT[10 + (c as u8 - b'A') as usize],
        '%' => [0b11001, 0b11010, 0b00100, 0b01011, 0b10011],
        '-' => [0b00000, 0b00000, 0b11111, 0b00000, 0b00000],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
        _ => return,
    };
    let (w, h) = canvas.dimensions();
    for (row, &bits) in glyph.iter().enumerate() {
        for bit in 0..5u32 {
            if (bits >> (4 - bit)) & 1 == 0 { continue; }
            for sy in 0..scale {
                for sx in 0..scale {
                    let x = px + bit * scale + sx;
                    let y = py + row as u32 * scale + sy;
                    if x < w && y < h {
                        blend(canvas, x, y, col);
                    }
                }
            }
        }
    }
}

fn blend(canvas: &mut image::RgbaImage, x: u32, y: u32, col: [u8; 4]) {
    let p = canvas.get_pixel_mut(x, y);
    let a = col[3] as f32 / 255.0;
    for i in 0..3 {
        p[i] = (p[i] as f32 * (1.0 - a) + col[i] as f32 * a).round() as u8;
    }
    p[3] = 255;
}

/// 5×5 bitmap font (digits 0-9, letters A-Z).
const FONT: [[u8; 5]; 36] = [
    [0b01110, 0b10001, 0b10001, 0b10001, 0b01110], // 0
    [0b00100, 0b01100, 0b00100, 0b00100, 0b01110], // 1
    [0b01110, 0b10001, 0b00110, 0b01000, 0b11111], // 2
    [0b11110, 0b00001, 0b00110, 0b00001, 0b11110], // 3
    [0b00110, 0b01010, 0b10010, 0b11111, 0b00010], // 4
    [0b11111, 0b10000, 0b11110, 0b00001, 0b11110], // 5
    [0b01110, 0b10000, 0b11110, 0b10001, 0b01110], // 6
    [0b11111, 0b00001, 0b00010, 0b00100, 0b00100], // 7
    [0b01110, 0b10001, 0b01110, 0b10001, 0b01110], // 8
    [0b01110, 0b10001, 0b01111, 0b00001, 0b01110], // 9
    [0b01110, 0b10001, 0b11111, 0b10001, 0b10001], // A
    [0b11110, 0b10001, 0b11110, 0b10001, 0b11110], // B
    [0b01110, 0b10000, 0b10000, 0b10000, 0b01110], // C
    [0b11100, 0b10010, 0b10001, 0b10010, 0b11100], // D
    [0b11111, 0b10000, 0b11110, 0b10000, 0b11111], // E
    [0b11111, 0b10000, 0b11110, 0b10000, 0b10000], // F
    [0b01110, 0b10000, 0b10011, 0b10001, 0b01110], // G
    [0b10001, 0b10001, 0b11111, 0b10001, 0b10001], // H
    [0b01110, 0b00100, 0b00100, 0b00100, 0b01110], // I
    [0b00111, 0b00010, 0b00010, 0b10010, 0b01100], // J
    [0b10001, 0b10010, 0b11100, 0b10010, 0b10001], // K
    [0b10000, 0b10000, 0b10000, 0b10000, 0b11111], // L
    [0b10001, 0b11011, 0b10101, 0b10001, 0b10001], // M
    [0b10001, 0b11001, 0b10101, 0b10011, 0b10001], // N
    [0b01110, 0b10001, 0b10001, 0b10001, 0b01110], // O
    [0b11110, 0b10001, 0b11110, 0b10000, 0b10000], // P
    [0b01110, 0b10001, 0b10101, 0b10010, 0b01101], // Q
    [0b11110, 0b10001, 0b11110, 0b10010, 0b10001], // R
    [0b01111, 0b10000, 0b01110, 0b00001, 0b11110], // S
    [0b11111, 0b00100, 0b00100, 0b00100, 0b00100], // T
    [0b10001, 0b10001, 0b10001, 0b10001, 0b01110], // U
    [0b10001, 0b10001, 0b10001, 0b01010, 0b00100], // V
    [0b10001, 0b10001, 0b10101, 0b11011, 0b10001], // W
    [0b10001, 0b01010, 0b00100, 0b01010, 0b10001], // X
    [0b10001, 0b01010, 0b00100, 0b00100, 0b00100], // Y
    [0b11111, 0b00010, 0b00100, 0b01000, 0b11111], // Z
];
