use crate::{CandidatePolicy, Charset, ScanError};

/// Tuning knobs of the scan pipeline.
///
/// Defaults reproduce the robot's scanner: 5x5 blur, 11x11 Gaussian threshold
/// block with `C = 2`, a 10% area floor, 2% polygon tolerance, a 640px wide
/// canonical card and the bottom 7% / left 50% identifier strip at 2x contrast.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Rotate frames 90 degrees clockwise before detection (camera mounted sideways).
    pub rotate_90: bool,

    /// Width of the rectified card; height follows the 63:88 card ratio.
    pub canonical_width: u32,

    /// Minimum share of the frame the card outline must cover.
    pub min_area_ratio: f32,

    /// Polygon simplification tolerance as a share of the outline's perimeter.
    pub approx_epsilon_ratio: f64,

    pub blur_sigma: f32,
    pub threshold_block_radius: u32,
    pub threshold_delta: i32,

    pub region_height_ratio: f32,
    pub region_width_ratio: f32,
    pub contrast_factor: f32,

    pub candidate_policy: CandidatePolicy,
    pub charset: Charset,

    /// Crop the identifier strip from the whole frame when no card outline is found.
    pub fallback_to_full_frame: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rotate_90: false,
            canonical_width: 640,
            min_area_ratio: 0.10,
            approx_epsilon_ratio: 0.02,
            blur_sigma: 1.1,
            threshold_block_radius: 5,
            threshold_delta: 2,
            region_height_ratio: 0.07,
            region_width_ratio: 0.5,
            contrast_factor: 2.0,
            candidate_policy: CandidatePolicy::LastWins,
            charset: Charset::default(),
            fallback_to_full_frame: false,
        }
    }
}

impl ScanConfig {
    /// Reject values that would make a scan panic or produce a meaningless card.
    pub fn validate(&self) -> Result<(), ScanError> {
        let invalid = |msg: String| Err(ScanError::InvalidConfig(msg));

        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return invalid(format!("blur_sigma must be a positive number, got {}", self.blur_sigma));
        }
        if self.canonical_width < 2 {
            return invalid(format!("canonical_width must be at least 2, got {}", self.canonical_width));
        }
        if !(0.0..=1.0).contains(&self.min_area_ratio) {
            return invalid(format!("min_area_ratio must be within 0..=1, got {}", self.min_area_ratio));
        }
        if !(self.approx_epsilon_ratio.is_finite() && self.approx_epsilon_ratio > 0.0) {
            return invalid(format!(
                "approx_epsilon_ratio must be a positive number, got {}",
                self.approx_epsilon_ratio
            ));
        }
        for (name, ratio) in [
            ("region_height_ratio", self.region_height_ratio),
            ("region_width_ratio", self.region_width_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return invalid(format!("{name} must be within (0, 1], got {ratio}"));
            }
        }
        if !(self.contrast_factor.is_finite() && self.contrast_factor >= 0.0) {
            return invalid(format!("contrast_factor must be zero or more, got {}", self.contrast_factor));
        }
        Ok(())
    }
}
