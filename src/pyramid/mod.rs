//! Gaussian scale spaces over 2D slices and 3D volumes.
//!
//! Each octave holds `S + 3` Gaussian layers, each blurred from the previous
//! one, and the `S + 2` Difference-of-Gaussian layers between them. The next
//! octave starts from layer `S` of the previous one, decimated by 2 along
//! every axis. Border samples clamp to the buffer extents.

pub mod filters;
pub mod options;
pub mod scale_space;

pub use filters::{GaussianKernel, SeparableFilter};
pub use options::{ScaleSpaceOptions, MIN_OCTAVE_EXTENT};
pub use scale_space::{
    build_scale_space, octave_scale, Octave, PlanarScaleSpace, ScaleSpace, ScaleSpaceLayer, ScaleSpaceResult,
    VolumetricScaleSpace,
};
