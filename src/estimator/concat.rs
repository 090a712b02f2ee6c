use super::{check_pair, OffsetEstimator};
use crate::diagnostics::EstimateReport;
use crate::error::Result;
use crate::types::StitchOffset;
use crate::volume::VoxelVolume;

/// Reports zero overlap, so stitching appends the second volume as is.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleConcatEstimator;

impl OffsetEstimator for SimpleConcatEstimator {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn estimate_with_report(
        &self,
        first: &VoxelVolume,
        second: &VoxelVolume,
    ) -> Result<EstimateReport> {
        check_pair(first, second)?;
        let mut report = EstimateReport::new(self.name(), StitchOffset::overlap(0));
        report.reference = second.reference_offset();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size3;

    #[test]
    fn always_reports_zero_overlap() {
        let a = VoxelVolume::from_fn(Size3::new(2, 2, 3), |x, _, _| x as f32);
        let b = a.clone();
        assert_eq!(
            SimpleConcatEstimator.estimate(&a, &b).unwrap(),
            StitchOffset::new(0, 0, 0)
        );
    }
}
