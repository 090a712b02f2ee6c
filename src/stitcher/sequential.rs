//! Left fold of the pairwise merge over an ordered scan list.
use super::PairwiseStitcher;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{SeamReport, SeriesReport};
use crate::error::{Result, StitchError};
use crate::types::Offset3;
use crate::volume::VoxelVolume;
use std::time::Instant;

/// Merged volume plus the placement of every input.
#[derive(Clone, Debug)]
pub struct StitchedSeries {
    pub volume: VoxelVolume,
    /// `placements[i]` locates input `i` in the first input's frame.
    pub placements: Vec<Offset3>,
    pub report: SeriesReport,
}

#[derive(Debug)]
pub struct SequentialStitcher {
    pairwise: PairwiseStitcher,
}

impl SequentialStitcher {
    pub fn new(pairwise: PairwiseStitcher) -> Self {
        Self { pairwise }
    }

    pub fn pairwise(&self) -> &PairwiseStitcher {
        &self.pairwise
    }

    /// Merge all volumes in order.
    pub fn stitch(&self, volumes: &[VoxelVolume]) -> Result<VoxelVolume> {
        Ok(self.stitch_series(volumes)?.volume)
    }

    /// Merge all volumes in order and report where each one landed.
    ///
    /// The running merge keeps the first volume's frame, so each pairwise
    /// placement is already relative to the first input. The first error
    /// aborts the whole series.
    pub fn stitch_series(&self, volumes: &[VoxelVolume]) -> Result<StitchedSeries> {
        let start = Instant::now();
        let (head, rest) = volumes.split_first().ok_or(StitchError::EmptySeries)?;
        let mut merged = head.clone();
        let mut placements = vec![Offset3::default()];
        let mut seams = Vec::with_capacity(rest.len());

        for (i, next) in rest.iter().enumerate() {
            let seam_start = Instant::now();
            let index = i + 1;
            let step = self.pairwise.stitch_with_report(&merged, next)?;
            log::debug!(
                "seam {index}: applied {} placement ({}, {}, {}) depth {}",
                step.applied,
                step.placement.x,
                step.placement.y,
                step.placement.z,
                step.volume.size().z
            );
            placements.push(step.placement);
            seams.push(SeamReport {
                index,
                applied: step.applied,
                placement: step.placement,
                estimate: step.report,
                elapsed_ms: elapsed_ms(seam_start),
            });
            merged = step.volume;
        }

        let report = SeriesReport {
            placements: placements.clone(),
            seams,
            total_ms: elapsed_ms(start),
        };
        log::debug!(
            "stitched {} volumes into {} in {:.1} ms",
            volumes.len(),
            merged.size(),
            report.total_ms
        );
        Ok(StitchedSeries {
            volume: merged,
            placements,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{SimpleConcatEstimator, SsdEstimator};
    use crate::types::Size3;

    fn world(x: usize, y: usize, z: usize) -> f32 {
        ((x * 5 + y * 3 + z * 7) % 11) as f32 + z as f32 * 0.25
    }

    fn part(z0: usize, z1: usize) -> VoxelVolume {
        VoxelVolume::from_fn(Size3::new(5, 4, z1 - z0), |x, y, z| world(x, y, z + z0))
    }

    #[test]
    fn empty_series_is_an_error() {
        let stitcher = SequentialStitcher::new(PairwiseStitcher::new(Box::new(SimpleConcatEstimator)));
        assert!(matches!(stitcher.stitch(&[]), Err(StitchError::EmptySeries)));
    }

    #[test]
    fn single_volume_is_returned_unchanged() {
        let stitcher = SequentialStitcher::new(PairwiseStitcher::new(Box::new(SimpleConcatEstimator)));
        let only = part(0, 6);
        let out = stitcher.stitch_series(std::slice::from_ref(&only)).unwrap();
        assert_eq!(out.volume, only);
        assert_eq!(out.placements, vec![Offset3::default()]);
        assert!(out.report.seams.is_empty());
    }

    #[test]
    fn placements_are_relative_to_first_volume() {
        let parts = vec![part(0, 12), part(8, 20), part(15, 30)];
        let stitcher = SequentialStitcher::new(PairwiseStitcher::new(Box::new(SsdEstimator::default())));
        let out = stitcher.stitch_series(&parts).unwrap();
        assert_eq!(
            out.placements,
            vec![
                Offset3::new(0, 0, 0),
                Offset3::new(0, 0, 8),
                Offset3::new(0, 0, 15)
            ]
        );
        assert_eq!(out.volume.size(), Size3::new(5, 4, 30));
        assert_eq!(out.volume.data(), part(0, 30).data());
        assert_eq!(out.volume.estimated_offset(), Some(Offset3::new(0, 0, 15)));
        assert_eq!(out.report.seams.len(), 2);
        assert_eq!(out.report.seams[1].applied.dz, 5);
    }
}
