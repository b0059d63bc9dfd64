//! Render plan handed to the host shell: boxes to stroke over the preview
//! and rows for the results list, both in wire order.
use serde::Serialize;

use crate::detection::confidence::{colour_tier, fill_percent, label_percent, ConfidenceTier};
use crate::detection::transform::{compute_display_box, label_anchor, scale_bounding_box};
use crate::detection::types::{Detection, DetectionResponse, DisplayBox, ImageDimensions, ScaledBox};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxOverlay {
    pub index: usize,
    pub rect: ScaledBox,
    pub label_anchor: (f64, f64),
    pub label: String,
    pub tier: ConfidenceTier,
    pub colour: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub index: usize,
    pub class_name: String,
    pub percent: i64,
    /// Unrounded progress-bar fill, 0–100.
    pub fill_percent: f64,
    pub tier: ConfidenceTier,
    pub colour: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPlan {
    pub display: DisplayBox,
    pub boxes: Vec<BoxOverlay>,
    pub rows: Vec<ResultRow>,
}

impl OverlayPlan {
    /// "No objects detected" state: a successful reply with nothing in it.
    pub fn is_empty_state(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn overlay_label(detection: &Detection) -> String {
    format!("{} {}%", detection.class_name, label_percent(detection.confidence))
}

/// Build the plan for `response` over an image fitted to `container_width`.
///
/// Boxes are only produced once the image has been measured; the results
/// list does not depend on geometry and is always filled.
pub fn build_overlay(
    response: &DetectionResponse,
    dimensions: Option<ImageDimensions>,
    container_width: f64,
) -> OverlayPlan {
    let display = compute_display_box(dimensions, container_width);
    let measured = dimensions.filter(|d| d.is_measured());

    let boxes = match measured {
        Some(dims) => response
            .detections
            .iter()
            .enumerate()
            .map(|(index, det)| {
                let rect = scale_bounding_box(&det.bbox, &dims, &display);
                let tier = colour_tier(det.confidence);
                BoxOverlay {
                    index,
                    rect,
                    label_anchor: label_anchor(&rect),
                    label: overlay_label(det),
                    tier,
                    colour: tier.colour(),
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let rows = response
        .detections
        .iter()
        .enumerate()
        .map(|(index, det)| {
            let tier = colour_tier(det.confidence);
            ResultRow {
                index,
                class_name: det.class_name.clone(),
                percent: label_percent(det.confidence),
                fill_percent: fill_percent(det.confidence),
                tier,
                colour: tier.colour(),
            }
        })
        .collect();

    OverlayPlan { display, boxes, rows }
}

/// Plain-text summary of the results, one line per detection.
pub fn summarize(response: &DetectionResponse) -> String {
    if response.is_empty() {
        return "No objects detected.".to_string();
    }
    let mut lines = vec![format!("Detected {} object(s):", response.detections.len())];
    for det in &response.detections {
        lines.push(format!(
            "  - {} ({}%, {})",
            det.class_name,
            label_percent(det.confidence),
            colour_tier(det.confidence).as_str()
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::BoundingBox;

    fn det(class: &str, confidence: f64, bbox: [f64; 4]) -> Detection {
        Detection {
            class_name: class.into(),
            confidence,
            bbox: BoundingBox { x1: bbox[0], y1: bbox[1], x2: bbox[2], y2: bbox[3] },
        }
    }

    #[test]
    fn boxes_and_rows_share_tier_and_order() {
        let resp = DetectionResponse {
            detections: vec![
                det("person", 0.7, [100.0, 100.0, 300.0, 200.0]),
                det("bike", 0.95, [0.0, 0.0, 1000.0, 500.0]),
            ],
        };
        let plan = build_overlay(&resp, Some(ImageDimensions::new(1000.0, 500.0)), 300.0);

        assert_eq!(plan.boxes.len(), 2);
        assert_eq!(plan.boxes[0].label, "person 70%");
        assert_eq!(plan.boxes[0].tier, ConfidenceTier::Medium);
        assert_eq!(plan.rows[0].tier, plan.boxes[0].tier);
        assert_eq!(plan.rows[1].class_name, "bike");
        assert_eq!(plan.rows[1].percent, 95);
        assert!((plan.boxes[0].rect.x - 30.0).abs() < 1e-9);
        assert!((plan.boxes[1].rect.width - 300.0).abs() < 1e-9);
        assert!(!plan.is_empty_state());
    }

    #[test]
    fn empty_response_is_empty_state() {
        let plan = build_overlay(
            &DetectionResponse::default(),
            Some(ImageDimensions::new(10.0, 10.0)),
            100.0,
        );
        assert!(plan.is_empty_state());
        assert!(plan.boxes.is_empty());
        assert_eq!(summarize(&DetectionResponse::default()), "No objects detected.");
    }

    #[test]
    fn unmeasured_image_gets_rows_but_no_boxes() {
        let resp = DetectionResponse { detections: vec![det("cup", 0.2, [1.0, 1.0, 2.0, 2.0])] };
        let plan = build_overlay(&resp, None, 200.0);
        assert!(plan.boxes.is_empty());
        assert_eq!(plan.rows.len(), 1);
        assert_eq!(plan.rows[0].tier, ConfidenceTier::Low);
        assert_eq!(plan.display, DisplayBox { width: 200.0, height: 200.0 });
    }
}
