//! Offset estimation from keypoints matched in 3D.
use super::{
    check_pair, log_against_reference, overlap_slabs, overlap_window, stitched_range,
    OffsetEstimator, VolumetricParams,
};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{EstimateReport, VolumeMatchReport};
use crate::error::Result;
use crate::features::{extract_volumetric, FeatureWorkspace};
use crate::matching::{match_descriptors, AxisSamples};
use crate::pyramid::build_scale_space;
use crate::volume::VoxelVolume;
use std::time::Instant;

/// Builds 3D scale spaces of both overlap slabs and matches their keypoints.
/// Each match votes `(x2 − x1, y2 − y1, z2 − z1 + M)`.
#[derive(Clone, Debug, Default)]
pub struct VolumetricFeatureEstimator {
    pub params: VolumetricParams,
}

impl VolumetricFeatureEstimator {
    pub fn new(params: VolumetricParams) -> Self {
        Self { params }
    }
}

impl OffsetEstimator for VolumetricFeatureEstimator {
    fn name(&self) -> &'static str {
        "volumetric"
    }

    fn estimate_with_report(
        &self,
        first: &VoxelVolume,
        second: &VoxelVolume,
    ) -> Result<EstimateReport> {
        check_pair(first, second)?;
        self.params.sift.validate()?;
        let start = Instant::now();
        let params = &self.params;
        let window = overlap_window(first, second, params.max_overlap, params.use_reference_hint);
        let (tail, head) = overlap_slabs(first, second, window, stitched_range(first, second))?;

        let options = params.sift.scale_space;
        let ss_a = build_scale_space(&tail.normalized(), options);
        let ss_b = build_scale_space(&head.normalized(), options);
        let pyramid_ms = elapsed_ms(start);

        let extract_start = Instant::now();
        let mut ws_a = FeatureWorkspace::new();
        let mut ws_b = FeatureWorkspace::new();
        extract_volumetric(&ss_a.scale_space, &params.sift, &mut ws_a);
        extract_volumetric(&ss_b.scale_space, &params.sift, &mut ws_b);
        let extract_ms = elapsed_ms(extract_start);

        let match_start = Instant::now();
        let mut matches = Vec::new();
        match_descriptors(ws_a.descriptors(), ws_b.descriptors(), &params.matcher, &mut matches);
        let mut samples = AxisSamples::new();
        for m in &matches {
            let k1 = &ws_a.volume_keypoints()[m.query];
            let k2 = &ws_b.volume_keypoints()[m.train];
            samples.x.push(k2.x - k1.x);
            samples.y.push(k2.y - k1.y);
            samples.z.push(k2.z - k1.z + window as f32);
        }
        let match_ms = elapsed_ms(match_start);
        log::debug!(
            "volumetric window={} keypoints={}/{} matches={}",
            window,
            ws_a.volume_keypoints().len(),
            ws_b.volume_keypoints().len(),
            matches.len()
        );
        if matches.is_empty() {
            log::warn!("volumetric: no matches, offset falls back to defaults");
        }

        let limit = first.size().z.min(second.size().z) as i32;
        let mut offset = samples.resolve();
        offset.dz = offset.dz.clamp(0, limit);

        let mut report = EstimateReport::new(self.name(), offset);
        report.overlap_window = window;
        report.samples = samples.counts().into();
        report.volumetric = Some(VolumeMatchReport {
            first: *ws_a.stats(),
            second: *ws_b.stats(),
            matches: matches.len(),
            first_octaves: ss_a.scale_space.octave_count(),
            second_octaves: ss_b.scale_space.octave_count(),
        });
        report.reference = second.reference_offset();
        report.timings.push("scaleSpace", pyramid_ms);
        report.timings.push("keypoints", extract_ms);
        report.timings.push("matching", match_ms);
        report.timings.total_ms = elapsed_ms(start);
        log_against_reference(self.name(), first, &report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Size3, StitchOffset};

    #[test]
    fn flat_volumes_fall_back_to_defaults() {
        let a = VoxelVolume::from_fn(Size3::new(16, 16, 12), |_, _, _| 3.0);
        let report = VolumetricFeatureEstimator::default()
            .estimate_with_report(&a, &a)
            .unwrap();
        assert_eq!(report.offset, StitchOffset::new(0, 0, 1));
        assert_eq!(report.overlap_window, 12);
        let vol = report.volumetric.unwrap();
        assert_eq!(vol.matches, 0);
        assert_eq!(vol.first.keypoints, 0);
    }
}
