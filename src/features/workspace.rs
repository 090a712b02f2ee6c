//! Per-side scratch buffers for the keypoint pipeline.
//!
//! One workspace serves every plane an estimator visits: `reset` clears the
//! keypoint and descriptor lists without releasing their storage, and
//! gradient layers are computed on demand the first time orientation or
//! description touches them.
use super::detect::{Candidate, VolumeCandidate};
use super::gradient::{central_gradients, Grad};
use super::keypoint::{Descriptor, Keypoint, VolumeKeypoint};
use super::ExtractionStats;
use crate::image::ImageF32;

/// Scratch storage reused across planes and pairs.
#[derive(Default)]
pub struct FeatureWorkspace {
    pub(crate) gradients: Vec<Option<Grad>>,
    pub(crate) layers_per_octave: usize,
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) volume_candidates: Vec<VolumeCandidate>,
    pub(crate) refined: Vec<Keypoint>,
    pub(crate) keypoints: Vec<Keypoint>,
    pub(crate) volume_keypoints: Vec<VolumeKeypoint>,
    pub(crate) descriptors: Vec<Descriptor>,
    pub(crate) stats: ExtractionStats,
}

impl FeatureWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears cached data and prepares gradient slots for
    /// `octaves × layers_per_octave` Gaussian layers.
    pub fn reset(&mut self, octaves: usize, layers_per_octave: usize) {
        let slots = octaves * layers_per_octave;
        self.gradients.iter_mut().for_each(|g| *g = None);
        if self.gradients.len() < slots {
            self.gradients.resize_with(slots, || None);
        }
        self.layers_per_octave = layers_per_octave;
        self.candidates.clear();
        self.volume_candidates.clear();
        self.refined.clear();
        self.keypoints.clear();
        self.volume_keypoints.clear();
        self.descriptors.clear();
        self.stats = ExtractionStats::default();
    }

    /// Planar keypoints of the last extraction, aligned with `descriptors`.
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    /// Volumetric keypoints of the last extraction, aligned with `descriptors`.
    pub fn volume_keypoints(&self) -> &[VolumeKeypoint] {
        &self.volume_keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }
}

/// Gradients of Gaussian layer `(octave, layer)`, computed once per reset.
pub(crate) fn ensure_gradients<'a>(
    gradients: &'a mut Vec<Option<Grad>>,
    layers_per_octave: usize,
    octave: usize,
    layer: usize,
    image: &ImageF32,
) -> &'a Grad {
    let slot = octave * layers_per_octave + layer;
    if slot >= gradients.len() {
        gradients.resize_with(slot + 1, || None);
    }
    gradients[slot].get_or_insert_with(|| central_gradients(image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradients_are_cached_until_reset() {
        let mut ws = FeatureWorkspace::new();
        ws.reset(2, 6);
        let mut img = ImageF32::new(4, 4);
        img.set(2, 2, 1.0);
        let first = ensure_gradients(&mut ws.gradients, 6, 1, 3, &img).gx.get(1, 2);
        assert_eq!(first, 0.5);

        let other = ImageF32::new(4, 4);
        let cached = ensure_gradients(&mut ws.gradients, 6, 1, 3, &other).gx.get(1, 2);
        assert_eq!(cached, 0.5, "cache should keep the first layer");

        ws.reset(2, 6);
        let fresh = ensure_gradients(&mut ws.gradients, 6, 1, 3, &other).gx.get(1, 2);
        assert_eq!(fresh, 0.0);
    }
}
