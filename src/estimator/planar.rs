//! Offset estimation from keypoints matched on 2D slices.
//!
//! Pass one cuts both overlap slabs along the configured vertical planes.
//! A match between slab rows `r1` and `r2` votes `r2 − r1 + M` for the
//! overlap depth; its column displacement votes for Y on sagittal cuts and
//! for X on coronal cuts. Pass two takes transverse cuts at matching depths
//! inside the resolved overlap and votes both lateral axes. Each axis is
//! resolved by its median.
use super::{
    check_pair, log_against_reference, overlap_window, stitched_range, OffsetEstimator,
    PlanarParams,
};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{EstimateReport, PlanePass, PlaneReport};
use crate::error::Result;
use crate::features::{extract_planar, FeatureWorkspace, Keypoint};
use crate::image::ImageF32;
use crate::matching::{match_descriptors, AxisSamples, Match};
use crate::pyramid::PlanarScaleSpace;
use crate::types::{Range, StitchOffset};
use crate::volume::{Plane, VoxelVolume};
use std::time::Instant;

#[derive(Clone, Debug, Default)]
pub struct PlanarFeatureEstimator {
    pub params: PlanarParams,
}

impl PlanarFeatureEstimator {
    pub fn new(params: PlanarParams) -> Self {
        Self { params }
    }
}

/// Slice of `vol` remapped from `range` into `[0, 1]`.
fn unit_slice(vol: &VoxelVolume, plane: Plane, index: usize, range: Range) -> Result<ImageF32> {
    let mut img = vol.slice(plane, index)?;
    for v in img.data.iter_mut() {
        *v = range.fit(*v, Range::UNIT);
    }
    Ok(img)
}

/// Paired workspaces plus the match buffer, reused across slices.
struct SlicePair<'a> {
    params: &'a PlanarParams,
    first: FeatureWorkspace,
    second: FeatureWorkspace,
    matches: Vec<Match>,
}

impl<'a> SlicePair<'a> {
    fn new(params: &'a PlanarParams) -> Self {
        Self {
            params,
            first: FeatureWorkspace::new(),
            second: FeatureWorkspace::new(),
            matches: Vec::new(),
        }
    }

    /// Extract and match keypoints of two slices.
    fn run(&mut self, a: &ImageF32, b: &ImageF32) {
        let options = self.params.sift.scale_space;
        let ss_a = PlanarScaleSpace::build(a, options);
        let ss_b = PlanarScaleSpace::build(b, options);
        extract_planar(&ss_a, &self.params.sift, &mut self.first);
        extract_planar(&ss_b, &self.params.sift, &mut self.second);
        match_descriptors(
            self.first.descriptors(),
            self.second.descriptors(),
            &self.params.matcher,
            &mut self.matches,
        );
    }

    fn pairs(&self) -> impl Iterator<Item = (&Keypoint, &Keypoint)> + '_ {
        self.matches.iter().map(move |m| {
            (
                &self.first.keypoints()[m.query],
                &self.second.keypoints()[m.train],
            )
        })
    }

    fn report(&self, pass: PlanePass, plane: Plane, first_index: usize, second_index: usize) -> PlaneReport {
        PlaneReport {
            pass,
            plane,
            first_index,
            second_index,
            first: *self.first.stats(),
            second: *self.second.stats(),
            matches: self.matches.len(),
        }
    }
}

impl OffsetEstimator for PlanarFeatureEstimator {
    fn name(&self) -> &'static str {
        "planar"
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
        let range = stitched_range(first, second);
        let window = overlap_window(first, second, params.max_overlap, params.use_reference_hint);
        let tail = first.slab(first.size().z - window, first.size().z)?;
        let head = second.slab(0, window)?;
        let size = tail.size();

        let mut samples = AxisSamples::new();
        let mut planes = Vec::new();
        let mut pair = SlicePair::new(params);

        let pass_start = Instant::now();
        for sample in &params.planes {
            let plane = sample.plane;
            if plane == Plane::Transverse {
                log::warn!("planar: transverse cut in the overlap plane list ignored");
                continue;
            }
            let index = plane.index_extent(size).map_or(0, |extent| sample.index(extent));
            let a = unit_slice(&tail, plane, index, range)?;
            let b = unit_slice(&head, plane, index, range)?;
            pair.run(&a, &b);
            for (k1, k2) in pair.pairs() {
                samples.z.push(k2.y - k1.y + window as f32);
                match plane {
                    Plane::Sagittal => samples.y.push(k2.x - k1.x),
                    Plane::Coronal => samples.x.push(k2.x - k1.x),
                    _ => {}
                }
            }
            log::debug!(
                "planar {:?}@{} keypoints={}/{} matches={}",
                plane,
                index,
                pair.first.keypoints().len(),
                pair.second.keypoints().len(),
                pair.matches.len()
            );
            planes.push(pair.report(PlanePass::Overlap, plane, index, index));
        }
        let overlap_ms = elapsed_ms(pass_start);

        let limit = first.size().z.min(second.size().z) as i32;
        let dz = samples.resolve().dz.clamp(1, limit) as usize;

        let pass_start = Instant::now();
        if params.transverse_pass {
            for &fraction in &params.transverse_fractions {
                let inner = ((dz as f32 * fraction.clamp(0.0, 1.0)) as usize).min(dz - 1);
                let first_index = first.size().z - dz + inner;
                let a = unit_slice(first, Plane::Transverse, first_index, range)?;
                let b = unit_slice(second, Plane::Transverse, inner, range)?;
                pair.run(&a, &b);
                for (k1, k2) in pair.pairs() {
                    samples.x.push(k2.x - k1.x);
                    samples.y.push(k2.y - k1.y);
                }
                log::debug!(
                    "planar transverse {}/{} matches={}",
                    first_index,
                    inner,
                    pair.matches.len()
                );
                planes.push(pair.report(PlanePass::Transverse, Plane::Transverse, first_index, inner));
            }
        }
        let transverse_ms = elapsed_ms(pass_start);

        let resolved = samples.resolve();
        let offset = StitchOffset::new(resolved.dx, resolved.dy, dz as i32);
        let mut report = EstimateReport::new(self.name(), offset);
        report.overlap_window = window;
        report.samples = samples.counts().into();
        report.planes = planes;
        report.reference = second.reference_offset();
        report.timings.push("overlapPlanes", overlap_ms);
        report.timings.push("transversePlanes", transverse_ms);
        report.timings.total_ms = elapsed_ms(start);
        if report.samples.z == 0 {
            log::warn!("planar: no overlap matches, falling back to dz={dz}");
        }
        log_against_reference(self.name(), first, &report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::PlaneSample;
    use crate::types::Size3;

    #[test]
    fn flat_volumes_fall_back_to_defaults() {
        let a = VoxelVolume::from_fn(Size3::new(24, 24, 16), |_, _, _| 7.0);
        let b = a.clone();
        let report = PlanarFeatureEstimator::default()
            .estimate_with_report(&a, &b)
            .unwrap();
        assert_eq!(report.offset, StitchOffset::new(0, 0, 1));
        assert_eq!(report.planes.len(), 8 + 5);
        assert_eq!(report.total_matches(), 0);
    }

    #[test]
    fn transverse_entries_in_plane_list_are_skipped() {
        let a = VoxelVolume::from_fn(Size3::new(16, 16, 10), |x, y, z| (x ^ y ^ z) as f32);
        let est = PlanarFeatureEstimator::new(PlanarParams {
            planes: vec![
                PlaneSample::new(Plane::Transverse, 0.5),
                PlaneSample::new(Plane::Coronal, 0.5),
            ],
            transverse_pass: false,
            ..PlanarParams::default()
        });
        let report = est.estimate_with_report(&a, &a).unwrap();
        assert_eq!(report.planes.len(), 1);
        assert_eq!(report.planes[0].plane, Plane::Coronal);
        assert_eq!(report.planes[0].first_index, 8);
    }
}
