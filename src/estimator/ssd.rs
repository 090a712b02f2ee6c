//! Exhaustive overlap search by mean squared difference.
use super::{
    check_pair, log_against_reference, overlap_window, stitched_range, OffsetEstimator, SsdParams,
};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{AxisCounts, EstimateReport, SsdSample};
use crate::error::Result;
use crate::types::{Range, StitchOffset};
use crate::volume::VoxelVolume;
use std::time::Instant;

/// Tries every overlap depth in the window and keeps the one whose layers
/// agree best. Reports no lateral shift.
#[derive(Clone, Debug, Default)]
pub struct SsdEstimator {
    pub params: SsdParams,
}

impl SsdEstimator {
    pub fn new(params: SsdParams) -> Self {
        Self { params }
    }
}

/// Mean squared difference between the last `depth` layers of `first` and the
/// first `depth` layers of `second`, on `range` remapped to `[0, 1]`.
pub fn overlap_score(first: &VoxelVolume, second: &VoxelVolume, depth: usize, range: Range) -> f64 {
    let layer = first.size().layer_len();
    let count = depth * layer;
    if count == 0 {
        return f64::INFINITY;
    }
    let start = (first.size().z - depth) * layer;
    let tail = &first.data()[start..start + count];
    let head = &second.data()[..count];
    let sum: f64 = tail
        .iter()
        .zip(head)
        .map(|(&a, &b)| {
            let d = (range.fit(a, Range::UNIT) - range.fit(b, Range::UNIT)) as f64;
            d * d
        })
        .sum();
    sum / count as f64
}

impl OffsetEstimator for SsdEstimator {
    fn name(&self) -> &'static str {
        "ssd"
    }

    fn estimate_with_report(
        &self,
        first: &VoxelVolume,
        second: &VoxelVolume,
    ) -> Result<EstimateReport> {
        check_pair(first, second)?;
        let start = Instant::now();
        let range = stitched_range(first, second);
        let hi = overlap_window(
            first,
            second,
            self.params.max_overlap,
            self.params.use_reference_hint,
        );
        let lo = self.params.min_overlap.clamp(1, hi);
        let step = self.params.step.max(1);

        let mut curve = Vec::with_capacity((hi - lo) / step + 1);
        let mut best = (lo, f64::INFINITY);
        for depth in (lo..=hi).step_by(step) {
            let score = overlap_score(first, second, depth, range);
            // Strict comparison keeps the smallest depth on ties.
            if score < best.1 {
                best = (depth, score);
            }
            curve.push(SsdSample {
                overlap: depth,
                score,
            });
        }
        log::debug!(
            "ssd search window=[{lo}, {hi}] step={step} best={} score={:.6}",
            best.0,
            best.1
        );

        let mut report = EstimateReport::new(self.name(), StitchOffset::overlap(best.0 as i32));
        report.overlap_window = hi;
        report.samples = AxisCounts {
            x: 0,
            y: 0,
            z: curve.len(),
        };
        report.ssd_curve = curve;
        report.reference = second.reference_offset();
        report.timings.push_since("search", start);
        report.timings.total_ms = elapsed_ms(start);
        log_against_reference(self.name(), first, &report);
        Ok(report)
    }
}
