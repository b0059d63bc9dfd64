//! Confidence presentation shared by the box overlay and the results list.
use serde::{Deserialize, Serialize};

const HIGH_THRESHOLD: f64 = 0.7;
const MEDIUM_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Hex colour used for both the overlay stroke and the progress-bar fill.
    pub fn colour(self) -> &'static str {
        match self {
            ConfidenceTier::High => "#4CAF50",   // green
            ConfidenceTier::Medium => "#FFC107", // amber
            ConfidenceTier::Low => "#F44336",    // red
        }
    }

    pub fn rgba(self) -> [u8; 4] {
        match self {
            ConfidenceTier::High => [76, 175, 80, 230],
            ConfidenceTier::Medium => [255, 193, 7, 230],
            ConfidenceTier::Low => [244, 67, 54, 230],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

/// Boundary values belong to the lower tier: 0.7 is medium, 0.4 is low.
pub fn colour_tier(confidence: f64) -> ConfidenceTier {
    if confidence > HIGH_THRESHOLD {
        ConfidenceTier::High
    } else if confidence > MEDIUM_THRESHOLD {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

/// Whole-number percentage for labels, rounding half up.
pub fn label_percent(confidence: f64) -> i64 {
    (confidence * 100.0 + 0.5).floor() as i64
}

/// Unrounded fill width for the progress bar, in percent.
pub fn fill_percent(confidence: f64) -> f64 {
    confidence * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_fall_to_lower_tier() {
        assert_eq!(colour_tier(0.7), ConfidenceTier::Medium);
        assert_eq!(colour_tier(0.70001), ConfidenceTier::High);
        assert_eq!(colour_tier(0.4), ConfidenceTier::Low);
        assert_eq!(colour_tier(0.40001), ConfidenceTier::Medium);
    }

    #[test]
    fn tier_is_total_over_unit_interval() {
        for i in 0..=1000 {
            let c = i as f64 / 1000.0;
            let tier = colour_tier(c);
            let expected = if c > 0.7 {
                ConfidenceTier::High
            } else if c > 0.4 {
                ConfidenceTier::Medium
            } else {
                ConfidenceTier::Low
            };
            assert_eq!(tier, expected, "confidence {c}");
        }
        assert_eq!(colour_tier(0.0), ConfidenceTier::Low);
        assert_eq!(colour_tier(1.0), ConfidenceTier::High);
    }

    #[test]
    fn label_percent_rounds_half_up() {
        assert_eq!(label_percent(0.875), 88);
        assert_eq!(label_percent(0.5), 50);
        assert_eq!(label_percent(0.004), 0);
        assert_eq!(label_percent(0.005), 1);
        assert_eq!(label_percent(1.0), 100);
    }

    #[test]
    fn fill_is_unrounded() {
        assert!((fill_percent(0.8734) - 87.34).abs() < 1e-9);
        assert_eq!(label_percent(0.8734), 87);
    }

    #[test]
    fn colours_are_distinct() {
        assert_ne!(ConfidenceTier::High.colour(), ConfidenceTier::Medium.colour());
        assert_ne!(ConfidenceTier::Medium.colour(), ConfidenceTier::Low.colour());
        assert_eq!(ConfidenceTier::Medium.as_str(), "medium");
    }
}
