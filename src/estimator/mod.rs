//! Offset estimation between consecutive scans.
//!
//! An [`OffsetEstimator`] looks at two volumes that share lateral dimensions
//! and reports how many Z layers the tail of the first shares with the head
//! of the second, plus the lateral shift of the second. Four strategies are
//! provided:
//!
//! - [`SsdEstimator`]: exhaustive search minimizing the mean squared voxel
//!   difference of the overlapping layers.
//! - [`PlanarFeatureEstimator`]: keypoints matched on vertical and
//!   transverse slices.
//! - [`VolumetricFeatureEstimator`]: keypoints matched in 3D.
//! - [`SimpleConcatEstimator`]: no overlap, plain concatenation.
//!
//! All of them compare intensities on the combined range of both inputs
//! remapped to `[0, 1]`.

pub mod concat;
pub mod params;
pub mod planar;
pub mod ssd;
pub mod volumetric;

pub use concat::SimpleConcatEstimator;
pub use params::{default_planes, PlanarParams, PlaneSample, SsdParams, VolumetricParams};
pub use planar::PlanarFeatureEstimator;
pub use ssd::SsdEstimator;
pub use volumetric::VolumetricFeatureEstimator;

use crate::diagnostics::EstimateReport;
use crate::error::{Result, StitchError};
use crate::types::{Range, StitchOffset};
use crate::volume::VoxelVolume;
use serde::{Deserialize, Serialize};

/// Strategy computing the [`StitchOffset`] of `second` relative to `first`.
pub trait OffsetEstimator: Send + Sync {
    /// Short identifier used in reports and logs.
    fn name(&self) -> &'static str;

    /// Estimate the offset and return the full trace.
    fn estimate_with_report(
        &self,
        first: &VoxelVolume,
        second: &VoxelVolume,
    ) -> Result<EstimateReport>;

    fn estimate(&self, first: &VoxelVolume, second: &VoxelVolume) -> Result<StitchOffset> {
        Ok(self.estimate_with_report(first, second)?.offset)
    }
}

/// Estimator selection as read from configuration files.
///
/// ```
/// use volume_stitcher::estimator::EstimatorConfig;
///
/// let cfg: EstimatorConfig =
///     serde_json::from_str(r#"{"kind": "ssd", "step": 2}"#).unwrap();
/// assert_eq!(cfg.build().name(), "ssd");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorConfig {
    Ssd(SsdParams),
    Planar(PlanarParams),
    Volumetric(VolumetricParams),
    Concat,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig::Planar(PlanarParams::default())
    }
}

impl EstimatorConfig {
    pub fn build(&self) -> Box<dyn OffsetEstimator> {
        match self {
            EstimatorConfig::Ssd(p) => Box::new(SsdEstimator::new(*p)),
            EstimatorConfig::Planar(p) => Box::new(PlanarFeatureEstimator::new(p.clone())),
            EstimatorConfig::Volumetric(p) => Box::new(VolumetricFeatureEstimator::new(*p)),
            EstimatorConfig::Concat => Box::new(SimpleConcatEstimator),
        }
    }
}

/// Combined intensity range of two volumes.
pub fn stitched_range(first: &VoxelVolume, second: &VoxelVolume) -> Range {
    first.range().union(&second.range())
}

/// Fail on empty inputs or mismatched lateral dimensions.
pub(crate) fn check_pair(first: &VoxelVolume, second: &VoxelVolume) -> Result<()> {
    for vol in [first, second] {
        if vol.size().is_empty() {
            return Err(StitchError::EmptyVolume(vol.size()));
        }
    }
    if !first.size().same_lateral(&second.size()) {
        return Err(StitchError::ShapeMismatch {
            first: first.size(),
            second: second.size(),
        });
    }
    Ok(())
}

/// Depth `M` of the slabs an estimator compares.
///
/// Starts from `max_overlap` (or `min(A.Z, B.Z)`). With `use_hint` and a
/// reference offset on `second` whose `z` lies inside `first`, the window
/// becomes the expected overlap plus a margin of `max(5, overlap / 5)`.
/// The result is clamped into `[1, min(A.Z, B.Z)]`.
pub fn overlap_window(
    first: &VoxelVolume,
    second: &VoxelVolume,
    max_overlap: Option<usize>,
    use_hint: bool,
) -> usize {
    let limit = first.size().z.min(second.size().z);
    let mut window = max_overlap.unwrap_or(limit);
    if use_hint {
        match second.reference_offset() {
            Some(reference) if reference.z > 0 => {
                let expected = first.size().z as i64 - reference.z as i64;
                if expected >= 0 {
                    window = (expected + (expected / 5).max(5)) as usize;
                    log::debug!(
                        "overlap_window reference z={} expected={} window={}",
                        reference.z,
                        expected,
                        window
                    );
                } else {
                    log::warn!(
                        "reference offset z={} lies beyond first volume depth {}",
                        reference.z,
                        first.size().z
                    );
                }
            }
            _ => {}
        }
    }
    window.clamp(1, limit.max(1))
}

/// Slabs of depth `window` from the tail of `first` and the head of `second`,
/// both carrying `range`.
pub(crate) fn overlap_slabs(
    first: &VoxelVolume,
    second: &VoxelVolume,
    window: usize,
    range: Range,
) -> Result<(VoxelVolume, VoxelVolume)> {
    let fz = first.size().z;
    let tail = first.slab(fz - window, fz)?.with_range(range)?;
    let head = second.slab(0, window)?.with_range(range)?;
    Ok((tail, head))
}

/// Debug comparison of an estimate against the second volume's reference.
pub(crate) fn log_against_reference(name: &str, first: &VoxelVolume, report: &EstimateReport) {
    let offset = report.offset;
    match report.reference {
        Some(reference) => {
            let expected = first.size().z as i32 - reference.z;
            log::debug!(
                "{name}: offset {offset} reference overlap={} lateral=({}, {})",
                expected,
                reference.x,
                reference.y
            );
        }
        None => log::debug!("{name}: offset {offset}"),
    }
}
