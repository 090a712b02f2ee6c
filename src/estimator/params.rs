//! Estimator tunables.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only
//! names the knobs it changes.

use crate::features::SiftParams;
use crate::matching::MatcherParams;
use crate::volume::Plane;
use serde::{Deserialize, Serialize};

/// Brute-force overlap search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsdParams {
    pub min_overlap: usize,
    /// Upper bound of the search. `None` means `min(A.Z, B.Z)`.
    pub max_overlap: Option<usize>,
    pub step: usize,
    /// Narrow the window around the second volume's reference offset.
    pub use_reference_hint: bool,
}

impl Default for SsdParams {
    fn default() -> Self {
        Self {
            min_overlap: 1,
            max_overlap: None,
            step: 1,
            use_reference_hint: false,
        }
    }
}

/// One vertical cut of the overlap pass, at `fraction` of the fixed axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneSample {
    pub plane: Plane,
    #[serde(default = "PlaneSample::default_fraction")]
    pub fraction: f32,
}

impl PlaneSample {
    pub const fn new(plane: Plane, fraction: f32) -> Self {
        Self { plane, fraction }
    }

    fn default_fraction() -> f32 {
        0.5
    }

    /// Slice index for a volume whose fixed axis spans `extent` samples.
    pub fn index(&self, extent: usize) -> usize {
        let idx = (self.fraction.clamp(0.0, 1.0) * extent as f32) as usize;
        idx.min(extent.saturating_sub(1))
    }
}

/// Default vertical cuts: three sagittal, three coronal and both diagonals.
pub fn default_planes() -> Vec<PlaneSample> {
    vec![
        PlaneSample::new(Plane::Sagittal, 0.4),
        PlaneSample::new(Plane::Sagittal, 0.5),
        PlaneSample::new(Plane::Sagittal, 0.6),
        PlaneSample::new(Plane::Coronal, 0.4),
        PlaneSample::new(Plane::Coronal, 0.5),
        PlaneSample::new(Plane::Coronal, 0.6),
        PlaneSample::new(Plane::Diagonal, 0.0),
        PlaneSample::new(Plane::AntiDiagonal, 0.0),
    ]
}

/// Slice-based keypoint estimation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanarParams {
    pub sift: SiftParams,
    /// Slab depth `M`. `None` means `min(A.Z, B.Z)`.
    pub max_overlap: Option<usize>,
    pub planes: Vec<PlaneSample>,
    /// Run the transverse pass that votes for the lateral offset.
    pub transverse_pass: bool,
    /// Positions inside the resolved overlap where transverse cuts are taken.
    pub transverse_fractions: Vec<f32>,
    pub matcher: MatcherParams,
    pub use_reference_hint: bool,
}

impl Default for PlanarParams {
    fn default() -> Self {
        Self {
            sift: SiftParams::planar(),
            max_overlap: None,
            planes: default_planes(),
            transverse_pass: true,
            transverse_fractions: vec![0.3, 0.4, 0.5, 0.6, 0.7],
            matcher: MatcherParams::default(),
            use_reference_hint: false,
        }
    }
}

/// Volume-based keypoint estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumetricParams {
    pub sift: SiftParams,
    /// Slab depth `M`. `None` means `min(A.Z, B.Z)`.
    pub max_overlap: Option<usize>,
    pub matcher: MatcherParams,
    pub use_reference_hint: bool,
}

impl Default for VolumetricParams {
    fn default() -> Self {
        Self {
            sift: SiftParams::volumetric(),
            max_overlap: None,
            matcher: MatcherParams::default(),
            use_reference_hint: false,
        }
    }
}
