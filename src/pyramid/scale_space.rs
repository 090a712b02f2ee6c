use super::filters::{
    blur_image, blur_volume, half_sample_image, half_sample_volume, GaussianKernel,
    SeparableFilter,
};
use super::options::ScaleSpaceOptions;
use crate::image::{ImageF32, VolumeF32};

use std::time::Instant;

/// Buffer type a scale space can be built over.
pub trait ScaleSpaceLayer: Clone + Send + Sync {
    fn blurred(&self, filter: &dyn SeparableFilter) -> Self;
    fn half_sampled(&self) -> Self;
    /// Sample-wise `self - other`.
    fn difference(&self, other: &Self) -> Self;
    fn min_extent(&self) -> usize;
}

impl ScaleSpaceLayer for ImageF32 {
    fn blurred(&self, filter: &dyn SeparableFilter) -> Self {
        blur_image(self, filter)
    }

    fn half_sampled(&self) -> Self {
        half_sample_image(self)
    }

    fn difference(&self, other: &Self) -> Self {
        let mut out = ImageF32::new(self.w, self.h);
        for ((o, a), b) in out.data.iter_mut().zip(&self.data).zip(&other.data) {
            *o = a - b;
        }
        out
    }

    fn min_extent(&self) -> usize {
        self.w.min(self.h)
    }
}

impl ScaleSpaceLayer for VolumeF32 {
    fn blurred(&self, filter: &dyn SeparableFilter) -> Self {
        blur_volume(self, filter)
    }

    fn half_sampled(&self) -> Self {
        half_sample_volume(self)
    }

    fn difference(&self, other: &Self) -> Self {
        let mut out = VolumeF32::new(self.w, self.h, self.d);
        for ((o, a), b) in out.data.iter_mut().zip(&self.data).zip(&other.data) {
            *o = a - b;
        }
        out
    }

    fn min_extent(&self) -> usize {
        VolumeF32::min_extent(self)
    }
}

/// Gaussian and Difference-of-Gaussian layers at one resolution.
#[derive(Clone, Debug, Default)]
pub struct Octave<L> {
    /// `S + 3` progressively blurred layers
    pub gaussians: Vec<L>,
    /// `S + 2` layers, `dogs[i] = gaussians[i] - gaussians[i + 1]`
    pub dogs: Vec<L>,
}

#[derive(Clone, Debug)]
pub struct ScaleSpace<L> {
    pub options: ScaleSpaceOptions,
    pub octaves: Vec<Octave<L>>,
}

pub type PlanarScaleSpace = ScaleSpace<ImageF32>;
pub type VolumetricScaleSpace = ScaleSpace<VolumeF32>;

impl<L: ScaleSpaceLayer> ScaleSpace<L> {
    /// Build the octave stack for `base`. Pure: equal inputs give bit-identical
    /// layers.
    pub fn build(base: &L, options: ScaleSpaceOptions) -> Self {
        assert!(options.levels >= 1, "scale space requires at least one level");
        assert!(options.octaves >= 1, "scale space requires at least one octave");

        let factor = options.kernel_radius_factor;
        let octave_count = options.effective_octaves(base.min_extent());
        let mut octaves: Vec<Octave<L>> = Vec::with_capacity(octave_count);

        for o in 0..octave_count {
            let first = match octaves.last() {
                None => base.blurred(&GaussianKernel::new(options.sigma, factor)),
                Some(prev) => prev.gaussians[options.levels].half_sampled(),
            };
            let mut gaussians = Vec::with_capacity(options.gaussian_layers());
            gaussians.push(first);
            for level in 1..options.gaussian_layers() {
                let kernel = GaussianKernel::new(options.layer_sigma(o, level), factor);
                let next = gaussians[level - 1].blurred(&kernel);
                gaussians.push(next);
            }
            let dogs = gaussians
                .windows(2)
                .map(|pair| pair[0].difference(&pair[1]))
                .collect();
            octaves.push(Octave { gaussians, dogs });
        }

        Self { options, octaves }
    }

    pub fn octave_count(&self) -> usize {
        self.octaves.len()
    }
}

/// Sample spacing of `octave` in base-resolution units.
#[inline]
pub fn octave_scale(octave: usize) -> f32 {
    2f32.powi(octave as i32)
}

/// Scale space plus construction time.
#[derive(Clone, Debug)]
pub struct ScaleSpaceResult<L> {
    pub scale_space: ScaleSpace<L>,
    pub elapsed_ms: f64,
}

pub fn build_scale_space<L: ScaleSpaceLayer>(
    base: &L,
    options: ScaleSpaceOptions,
) -> ScaleSpaceResult<L> {
    let start = Instant::now();
    let scale_space = ScaleSpace::build(base, options);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    log::debug!(
        "build_scale_space octaves={} levels={} sigma={} elapsed_ms={:.3}",
        scale_space.octave_count(),
        options.levels,
        options.sigma,
        elapsed_ms
    );
    ScaleSpaceResult {
        scale_space,
        elapsed_ms,
    }
}
