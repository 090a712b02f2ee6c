use crate::pyramid::octave_scale;
use serde::Serialize;

/// Descriptor length shared by planar and volumetric keypoints.
pub const DESCRIPTOR_LEN: usize = 128;

pub type Descriptor = [f32; DESCRIPTOR_LEN];

/// Refined 2D keypoint. Positions are in octave-0 pixel units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub octave: usize,
    /// DoG layer after refinement; the Gaussian layer of the same index is
    /// sampled for orientation and description.
    pub layer: usize,
    /// Refined fractional layer `layer + ds`.
    pub scale: f32,
    pub size: f32,
    /// Dominant gradient direction in radians, `[0, 2π)`.
    pub angle: f32,
    /// Interpolated DoG value at the refined extremum.
    pub response: f32,
}

impl Keypoint {
    /// Position in the sampling grid of the keypoint's octave.
    pub fn octave_position(&self) -> (f32, f32) {
        let s = octave_scale(self.octave);
        (self.x / s, self.y / s)
    }
}

/// Refined 3D keypoint. Volumes relate by translation only, so there is no
/// orientation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VolumeKeypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub octave: usize,
    pub layer: usize,
    pub scale: f32,
    pub size: f32,
    pub response: f32,
}

impl VolumeKeypoint {
    pub fn octave_position(&self) -> (f32, f32, f32) {
        let s = octave_scale(self.octave);
        (self.x / s, self.y / s, self.z / s)
    }
}

/// Size of a keypoint refined to fractional layer `scale` in `octave`:
/// `σ0·2^(scale/S)·2^(octave+1)`.
pub fn keypoint_size(sigma: f32, levels: usize, octave: usize, scale: f32) -> f32 {
    sigma * 2f32.powf(scale / levels as f32) * 2f32.powi(octave as i32 + 1)
}
