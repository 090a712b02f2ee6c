//! Compositing of overlapping scans.
//!
//! [`PairwiseStitcher`] merges two volumes that share X and Y. The result
//! holds all of the first volume followed by the part of the second volume
//! below the overlap, shifted laterally by the estimated `(dx, dy)`.
//! Destination voxels whose shifted source falls outside the second volume
//! take the minimum of the combined intensity range.
//!
//! [`SequentialStitcher`] folds the pairwise merge over an ordered list.

pub mod sequential;

pub use crate::estimator::stitched_range;
pub use sequential::{SequentialStitcher, StitchedSeries};

use crate::diagnostics::EstimateReport;
use crate::error::{Result, StitchError};
use crate::estimator::OffsetEstimator;
use crate::types::{Offset3, Size3, StitchOffset};
use crate::volume::VoxelVolume;

/// Layers inserted between scans by [`SeamPolicy::Gap`] unless configured.
pub const DEFAULT_GAP_LAYERS: usize = 5;

/// How the seam between two scans is resolved.
pub enum SeamPolicy {
    /// Overlap the scans at the offset reported by an estimator.
    Estimate(Box<dyn OffsetEstimator>),
    /// Keep the scans apart, separated by this many background layers.
    Gap(usize),
}

impl std::fmt::Debug for SeamPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeamPolicy::Estimate(est) => f.debug_tuple("Estimate").field(&est.name()).finish(),
            SeamPolicy::Gap(n) => f.debug_tuple("Gap").field(n).finish(),
        }
    }
}

/// Outcome of one pairwise merge.
#[derive(Clone, Debug)]
pub struct PairwiseStitch {
    pub volume: VoxelVolume,
    /// Offset used for compositing, after clamping.
    pub applied: StitchOffset,
    /// Placement of the second volume in the first volume's frame.
    pub placement: Offset3,
    /// Estimator trace; `None` for the gap policy.
    pub report: Option<EstimateReport>,
}

#[derive(Debug)]
pub struct PairwiseStitcher {
    policy: SeamPolicy,
}

impl PairwiseStitcher {
    pub fn new(estimator: Box<dyn OffsetEstimator>) -> Self {
        Self {
            policy: SeamPolicy::Estimate(estimator),
        }
    }

    pub fn with_gap(layers: usize) -> Self {
        Self {
            policy: SeamPolicy::Gap(layers),
        }
    }

    pub fn with_policy(policy: SeamPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SeamPolicy {
        &self.policy
    }

    /// Merge `second` below `first`.
    pub fn stitch(&self, first: &VoxelVolume, second: &VoxelVolume) -> Result<VoxelVolume> {
        Ok(self.stitch_with_report(first, second)?.volume)
    }

    /// Merge `second` below `first` and keep the estimator trace.
    pub fn stitch_with_report(
        &self,
        first: &VoxelVolume,
        second: &VoxelVolume,
    ) -> Result<PairwiseStitch> {
        check_lateral(first.size(), second.size())?;
        match &self.policy {
            SeamPolicy::Estimate(estimator) => {
                let report = estimator.estimate_with_report(first, second)?;
                let applied = clamp_offset(report.offset, first.size(), second.size());
                let volume = compose(first, second, applied)?;
                Ok(PairwiseStitch {
                    volume,
                    applied,
                    placement: applied.placement(first.size().z),
                    report: Some(report),
                })
            }
            SeamPolicy::Gap(layers) => {
                let applied = StitchOffset::overlap(-(*layers as i32));
                let volume = compose_with_gap(first, second, *layers)?;
                Ok(PairwiseStitch {
                    volume,
                    applied,
                    placement: applied.placement(first.size().z),
                    report: None,
                })
            }
        }
    }
}

fn check_lateral(first: Size3, second: Size3) -> Result<()> {
    if first.same_lateral(&second) {
        Ok(())
    } else {
        Err(StitchError::ShapeMismatch { first, second })
    }
}

/// Clamp the overlap depth into `[0, min(A.Z, B.Z)]`.
fn clamp_offset(offset: StitchOffset, first: Size3, second: Size3) -> StitchOffset {
    let limit = first.z.min(second.z) as i32;
    let dz = offset.dz.clamp(0, limit);
    if dz != offset.dz {
        log::warn!(
            "overlap {} outside [0, {}] for {} + {}, clamped to {}",
            offset.dz,
            limit,
            first,
            second,
            dz
        );
    }
    StitchOffset { dz, ..offset }
}

/// Composite `second` below `first` at `offset`.
///
/// The result has depth `A.Z + B.Z − dz` and holds `first` unchanged in its
/// top `A.Z` layers. Layer `A.Z + k` is `second(x + dx, y + dy, dz + k)`, or
/// the combined range minimum where that source is out of bounds. The overlap
/// is clamped into `[0, min(A.Z, B.Z)]`.
pub fn compose(
    first: &VoxelVolume,
    second: &VoxelVolume,
    offset: StitchOffset,
) -> Result<VoxelVolume> {
    let (sa, sb) = (first.size(), second.size());
    check_lateral(sa, sb)?;
    let offset = clamp_offset(offset, sa, sb);
    let dz = offset.dz as usize;
    let range = stitched_range(first, second);
    let out_size = Size3::new(sa.x, sa.y, sa.z + sb.z - dz);

    let mut data = Vec::with_capacity(out_size.volume());
    data.extend_from_slice(first.data());
    if offset.dx == 0 && offset.dy == 0 {
        data.extend_from_slice(&second.data()[dz * sb.layer_len()..]);
    } else {
        let fill = range.min;
        for z in dz..sb.z {
            for y in 0..sb.y {
                let sy = y as i64 + offset.dy as i64;
                for x in 0..sb.x {
                    let sx = x as i64 + offset.dx as i64;
                    let inside = (0..sb.x as i64).contains(&sx) && (0..sb.y as i64).contains(&sy);
                    data.push(if inside {
                        second.at(sx as usize, sy as usize, z)
                    } else {
                        fill
                    });
                }
            }
        }
    }

    let mut volume = VoxelVolume::new(out_size, data, range)?
        .with_reference_offset(first.reference_offset());
    volume.set_estimated_offset(Some(offset.placement(sa.z)));
    log::debug!("compose {} + {} at {} -> {}", sa, sb, offset, out_size);
    Ok(volume)
}

/// Stack `second` below `first` with `gap` background layers in between.
pub fn compose_with_gap(first: &VoxelVolume, second: &VoxelVolume, gap: usize) -> Result<VoxelVolume> {
    let (sa, sb) = (first.size(), second.size());
    check_lateral(sa, sb)?;
    let range = stitched_range(first, second);
    let out_size = Size3::new(sa.x, sa.y, sa.z + gap + sb.z);

    let mut data = Vec::with_capacity(out_size.volume());
    data.extend_from_slice(first.data());
    data.resize(data.len() + gap * sa.layer_len(), range.min);
    data.extend_from_slice(second.data());

    let mut volume = VoxelVolume::new(out_size, data, range)?
        .with_reference_offset(first.reference_offset());
    volume.set_estimated_offset(Some(Offset3::new(0, 0, (sa.z + gap) as i32)));
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::SimpleConcatEstimator;
    use crate::types::Range;

    fn coded(size: Size3, base: f32) -> VoxelVolume {
        VoxelVolume::from_fn(size, |x, y, z| base + (x + 10 * y + 100 * z) as f32)
    }

    #[test]
    fn compose_copies_first_and_tail_of_second() {
        let a = coded(Size3::new(3, 2, 4), 0.0);
        let b = coded(Size3::new(3, 2, 5), 1000.0);
        let c = compose(&a, &b, StitchOffset::overlap(2)).unwrap();
        assert_eq!(c.size(), Size3::new(3, 2, 7));
        assert_eq!(&c.data()[..a.data().len()], a.data());
        assert_eq!(c.at(1, 1, 4), b.at(1, 1, 2));
        assert_eq!(c.at(2, 0, 6), b.at(2, 0, 4));
        assert_eq!(c.range(), Range::new(0.0, 1000.0 + 2.0 + 10.0 + 400.0));
        assert_eq!(c.estimated_offset(), Some(Offset3::new(0, 0, 2)));
    }

    #[test]
    fn lateral_shift_rejects_out_of_bounds_sources() {
        let a = coded(Size3::new(4, 4, 2), 5.0);
        let b = coded(Size3::new(4, 4, 3), 50.0);
        let c = compose(&a, &b, StitchOffset::new(1, -1, 1)).unwrap();
        let fill = c.range().min;
        assert_eq!(fill, 5.0);
        // C(x, y, 2 + k) = B(x + 1, y - 1, 1 + k)
        assert_eq!(c.at(0, 1, 2), b.at(1, 0, 1));
        assert_eq!(c.at(2, 3, 3), b.at(3, 2, 2));
        assert_eq!(c.at(3, 2, 2), fill, "x + dx past the edge");
        assert_eq!(c.at(1, 0, 3), fill, "y + dy before the edge");
    }

    #[test]
    fn overlap_is_clamped() {
        let a = coded(Size3::new(2, 2, 3), 0.0);
        let b = coded(Size3::new(2, 2, 4), 0.0);
        assert_eq!(compose(&a, &b, StitchOffset::overlap(9)).unwrap().size().z, 4);
        assert_eq!(compose(&a, &b, StitchOffset::overlap(-2)).unwrap().size().z, 7);
    }

    #[test]
    fn shape_mismatch_fails_before_estimation() {
        let a = coded(Size3::new(3, 3, 3), 0.0);
        let b = coded(Size3::new(3, 4, 3), 0.0);
        let stitcher = PairwiseStitcher::new(Box::new(SimpleConcatEstimator));
        let err = stitcher.stitch(&a, &b).unwrap_err();
        assert!(
            matches!(err, StitchError::ShapeMismatch { first, second }
                if first == a.size() && second == b.size()),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn gap_policy_inserts_background_layers() {
        let a = coded(Size3::new(2, 2, 3), 10.0);
        let b = coded(Size3::new(2, 2, 2), 0.0);
        let out = PairwiseStitcher::with_gap(DEFAULT_GAP_LAYERS)
            .stitch_with_report(&a, &b)
            .unwrap();
        assert_eq!(out.volume.size(), Size3::new(2, 2, 10));
        assert_eq!(out.placement, Offset3::new(0, 0, 8));
        assert!(out.report.is_none());
        assert!((3..8).all(|z| out.volume.layer(z).iter().all(|&v| v == 0.0)));
        assert_eq!(out.volume.layer(8), b.layer(0));
    }

    #[test]
    fn concat_estimator_appends_whole_volume() {
        let a = coded(Size3::new(2, 2, 3), 0.0).with_reference_offset(Some(Offset3::new(1, 2, 3)));
        let b = coded(Size3::new(2, 2, 2), 0.0);
        let out = PairwiseStitcher::new(Box::new(SimpleConcatEstimator))
            .stitch_with_report(&a, &b)
            .unwrap();
        assert_eq!(out.volume.size().z, 5);
        assert_eq!(out.placement, Offset3::new(0, 0, 3));
        assert_eq!(out.volume.reference_offset(), Some(Offset3::new(1, 2, 3)));
        assert_eq!(out.report.unwrap().estimator, "concat");
    }
}
