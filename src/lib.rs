#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod error;
pub mod estimator;
pub mod image;
pub mod stitcher;
pub mod types;
pub mod volume;

// Pipeline internals, public for tools and experiments.
pub mod config;
pub mod diagnostics;
pub mod features;
pub mod matching;
pub mod pyramid;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{Result, StitchError};
pub use crate::estimator::{
    stitched_range, EstimatorConfig, OffsetEstimator, PlanarFeatureEstimator,
    SimpleConcatEstimator, SsdEstimator, VolumetricFeatureEstimator,
};
pub use crate::stitcher::{
    compose, PairwiseStitch, PairwiseStitcher, SeamPolicy, SequentialStitcher, StitchedSeries,
};
pub use crate::types::{Offset3, Range, Size3, StitchOffset};
pub use crate::volume::{Plane, VoxelVolume};

pub use crate::diagnostics::{EstimateReport, SeriesReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```
/// use volume_stitcher::prelude::*;
///
/// # fn main() -> volume_stitcher::Result<()> {
/// let world = |x: usize, y: usize, z: usize| ((x * 3 + y * 5 + z * 7) % 13) as f32 + z as f32;
/// let a = VoxelVolume::from_fn(Size3::new(8, 8, 12), world);
/// let b = VoxelVolume::from_fn(Size3::new(8, 8, 12), |x, y, z| world(x, y, z + 8));
///
/// let stitcher = PairwiseStitcher::new(Box::new(SsdEstimator::default()));
/// let merged = stitcher.stitch(&a, &b)?;
/// assert_eq!(merged.size(), Size3::new(8, 8, 20));
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::estimator::{
        OffsetEstimator, PlanarFeatureEstimator, SsdEstimator, VolumetricFeatureEstimator,
    };
    pub use crate::stitcher::{PairwiseStitcher, SequentialStitcher};
    pub use crate::types::{Range, Size3, StitchOffset};
    pub use crate::volume::{Plane, VoxelVolume};
}
