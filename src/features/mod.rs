//! Scale-invariant keypoints and descriptors for slices and volumes.
//!
//! Pipeline per scale space: detect DoG extrema → refine and filter them →
//! assign orientations (planar only) → build 128-value descriptors. Results
//! land in a [`FeatureWorkspace`] so estimators can reuse the buffers across
//! planes.

pub mod descriptor;
pub mod detect;
pub mod gradient;
pub mod keypoint;
pub mod localize;
pub mod orientation;
pub mod params;
pub mod workspace;

pub use descriptor::{describe_planar, describe_volumetric};
pub use keypoint::{Descriptor, Keypoint, VolumeKeypoint, DESCRIPTOR_LEN};
pub use localize::Rejection;
pub use params::SiftParams;
pub use workspace::FeatureWorkspace;

use crate::pyramid::{PlanarScaleSpace, VolumetricScaleSpace};
use detect::{detect_planar, detect_volumetric};
use localize::{localize_planar, localize_volumetric};
use orientation::assign_orientations;
use serde::Serialize;
use workspace::ensure_gradients;

/// Candidate bookkeeping for one extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub candidates: usize,
    pub singular: usize,
    pub out_of_bounds: usize,
    pub unconverged: usize,
    pub low_contrast: usize,
    pub edge: usize,
    pub keypoints: usize,
}

impl ExtractionStats {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Singular => self.singular += 1,
            Rejection::OutOfBounds => self.out_of_bounds += 1,
            Rejection::Unconverged => self.unconverged += 1,
            Rejection::LowContrast => self.low_contrast += 1,
            Rejection::Edge => self.edge += 1,
        }
    }
}

/// Detect, refine, orient and describe keypoints of a planar scale space.
pub fn extract_planar(ss: &PlanarScaleSpace, params: &SiftParams, ws: &mut FeatureWorkspace) {
    ws.reset(ss.octave_count(), ss.options.gaussian_layers());
    for (o, octave) in ss.octaves.iter().enumerate() {
        detect_planar(&octave.dogs, o, params.candidate_floor, &mut ws.candidates);
    }
    ws.stats.candidates = ws.candidates.len();
    for &cand in &ws.candidates {
        match localize_planar(&ss.octaves[cand.octave].dogs, cand, params) {
            Ok(kp) => ws.refined.push(kp),
            Err(rejection) => ws.stats.record(rejection),
        }
    }

    let FeatureWorkspace {
        gradients,
        layers_per_octave,
        refined,
        keypoints,
        descriptors,
        ..
    } = &mut *ws;
    for kp in refined.iter() {
        let gauss = &ss.octaves[kp.octave].gaussians[kp.layer];
        let grad = ensure_gradients(gradients, *layers_per_octave, kp.octave, kp.layer, gauss);
        let first = keypoints.len();
        assign_orientations(*kp, grad, params.orientation_peak_ratio, keypoints);
        for oriented in &keypoints[first..] {
            descriptors.push(describe_planar(oriented, grad));
        }
    }
    ws.stats.keypoints = ws.keypoints.len();
    log::debug!(
        "extract_planar candidates={} refined={} keypoints={}",
        ws.stats.candidates,
        ws.refined.len(),
        ws.stats.keypoints
    );
}

/// Detect, refine and describe keypoints of a volumetric scale space.
pub fn extract_volumetric(
    ss: &VolumetricScaleSpace,
    params: &SiftParams,
    ws: &mut FeatureWorkspace,
) {
    ws.reset(0, 0);
    for (o, octave) in ss.octaves.iter().enumerate() {
        detect_volumetric(
            &octave.dogs,
            o,
            params.candidate_floor,
            &mut ws.volume_candidates,
        );
    }
    ws.stats.candidates = ws.volume_candidates.len();
    for &cand in &ws.volume_candidates {
        match localize_volumetric(&ss.octaves[cand.octave].dogs, cand, params) {
            Ok(kp) => {
                let gauss = &ss.octaves[kp.octave].gaussians[kp.layer];
                ws.descriptors.push(describe_volumetric(&kp, gauss));
                ws.volume_keypoints.push(kp);
            }
            Err(rejection) => ws.stats.record(rejection),
        }
    }
    ws.stats.keypoints = ws.volume_keypoints.len();
    log::debug!(
        "extract_volumetric candidates={} keypoints={}",
        ws.stats.candidates,
        ws.stats.keypoints
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageF32, VolumeF32};
    use crate::pyramid::ScaleSpace;

    fn blob_image(w: usize, h: usize, blobs: &[(f32, f32, f32, f32)]) -> ImageF32 {
        let mut img = ImageF32::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let mut v = 0.1;
                for &(cx, cy, s, a) in blobs {
                    let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
                    v += a * (-d2 / (2.0 * s * s)).exp();
                }
                img.set(x, y, v);
            }
        }
        img
    }

    fn textured_blobs(w: usize, h: usize) -> Vec<(f32, f32, f32, f32)> {
        let mut state = 0x2545_f491u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 10_000) as f32 / 10_000.0
        };
        (0..40)
            .map(|_| {
                (
                    4.0 + next() * (w as f32 - 8.0),
                    4.0 + next() * (h as f32 - 8.0),
                    1.5 + next() * 2.5,
                    0.2 + next() * 0.6,
                )
            })
            .collect()
    }

    #[test]
    fn textured_image_yields_described_keypoints() {
        let img = blob_image(64, 64, &textured_blobs(64, 64));
        let params = SiftParams::planar();
        let ss = ScaleSpace::build(&img, params.scale_space);
        let mut ws = FeatureWorkspace::new();
        extract_planar(&ss, &params, &mut ws);

        assert!(!ws.keypoints().is_empty(), "stats: {:?}", ws.stats());
        assert_eq!(ws.keypoints().len(), ws.descriptors().len());
        assert_eq!(ws.stats().keypoints, ws.keypoints().len());
        for kp in ws.keypoints() {
            assert!((0.0..64.0).contains(&kp.x) && (0.0..64.0).contains(&kp.y), "{kp:?}");
            assert!((0.0..std::f32::consts::TAU).contains(&kp.angle), "{kp:?}");
            assert!(kp.size > 0.0);
        }
    }

    #[test]
    fn workspace_is_reused_between_extractions() {
        let params = SiftParams::planar();
        let mut ws = FeatureWorkspace::new();
        let a = ScaleSpace::build(&blob_image(48, 48, &textured_blobs(48, 48)), params.scale_space);
        extract_planar(&a, &params, &mut ws);
        let first = ws.keypoints().to_vec();
        let b = ScaleSpace::build(&blob_image(48, 48, &[]), params.scale_space);
        extract_planar(&b, &params, &mut ws);
        assert!(!first.is_empty());
        assert!(ws.keypoints().is_empty(), "flat image should yield nothing");
        assert!(ws.descriptors().is_empty());
    }

    #[test]
    fn single_volumetric_blob_yields_one_keypoint_at_its_centre() {
        let (cx, cy, cz, sigma) = (15.3f32, 16.6f32, 15.8f32, 2.5f32);
        let mut vol = VolumeF32::new(32, 32, 32);
        for z in 0..32 {
            for y in 0..32 {
                for x in 0..32 {
                    let d2 = (x as f32 - cx).powi(2)
                        + (y as f32 - cy).powi(2)
                        + (z as f32 - cz).powi(2);
                    vol.set(x, y, z, (-d2 / (2.0 * sigma * sigma)).exp());
                }
            }
        }
        let params = SiftParams::volumetric();
        let ss = ScaleSpace::build(&vol, params.scale_space);
        let mut ws = FeatureWorkspace::new();
        extract_volumetric(&ss, &params, &mut ws);

        assert_eq!(ws.volume_keypoints().len(), 1, "stats: {:?}", ws.stats());
        assert_eq!(ws.descriptors().len(), 1);
        let kp = ws.volume_keypoints()[0];
        assert!((kp.x - cx).abs() < 0.5, "{kp:?}");
        assert!((kp.y - cy).abs() < 0.5, "{kp:?}");
        assert!((kp.z - cz).abs() < 0.5, "{kp:?}");
    }
}
