//! Tunables of the keypoint pipeline.
//!
//! Contrast is measured on `[0, 1]`-normalized intensities and scaled by the
//! level count, so one threshold serves every `S`.

use crate::error::{Result, StitchError};
use crate::pyramid::ScaleSpaceOptions;
use serde::{Deserialize, Serialize};

/// Keypoint detection, refinement and orientation parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftParams {
    /// Scale-space layout.
    pub scale_space: ScaleSpaceOptions,
    /// Reject when `|D(x̂)|·S` falls below this.
    pub contrast_threshold: f32,
    /// Principal-curvature ratio `r` for the edge test.
    pub edge_ratio: f32,
    /// Newton iterations before a candidate is dropped.
    pub max_refine_steps: usize,
    /// Secondary orientation peaks at or above this fraction of the maximum
    /// spawn keypoint clones.
    pub orientation_peak_ratio: f32,
    /// Skip extremum candidates with `|D|` below this. `0` keeps all.
    pub candidate_floor: f32,
}

impl SiftParams {
    pub fn planar() -> Self {
        Self {
            scale_space: ScaleSpaceOptions::planar(),
            contrast_threshold: 0.03,
            edge_ratio: 10.0,
            max_refine_steps: 5,
            orientation_peak_ratio: 0.8,
            candidate_floor: 0.0,
        }
    }

    pub fn volumetric() -> Self {
        Self {
            scale_space: ScaleSpaceOptions::volumetric(),
            ..Self::planar()
        }
    }

    pub fn with_scale_space(mut self, scale_space: ScaleSpaceOptions) -> Self {
        self.scale_space = scale_space;
        self
    }

    pub fn with_contrast_threshold(mut self, threshold: f32) -> Self {
        self.contrast_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.scale_space.validate()?;
        if !(self.edge_ratio.is_finite() && self.edge_ratio >= 1.0) {
            return Err(StitchError::metadata(format!(
                "edge ratio must be at least 1, got {}",
                self.edge_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.orientation_peak_ratio) {
            return Err(StitchError::metadata(format!(
                "orientation peak ratio must lie in [0, 1], got {}",
                self.orientation_peak_ratio
            )));
        }
        Ok(())
    }
}

impl Default for SiftParams {
    fn default() -> Self {
        Self::planar()
    }
}
