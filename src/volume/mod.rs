//! Voxel volumes: the read-only inputs of estimation and the owned outputs of
//! stitching.
//!
//! Samples are stored layer-major, `data[z·X·Y + y·X + x]`. Construction
//! checks that the buffer length equals `X·Y·Z` and that the intensity range
//! is well formed. Every later operation relies on both.

pub mod slice;

pub use crate::types::{Offset3, Range, Size3};
pub use slice::Plane;

use crate::error::{Result, StitchError};
use crate::image::VolumeF32;

/// 3D scan reconstruction with intensity range and offset metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelVolume {
    data: Vec<f32>,
    size: Size3,
    range: Range,
    reference_offset: Option<Offset3>,
    estimated_offset: Option<Offset3>,
}

impl VoxelVolume {
    /// Wrap a voxel buffer with an explicit intensity range.
    pub fn new(size: Size3, data: Vec<f32>, range: Range) -> Result<Self> {
        if data.len() != size.volume() {
            return Err(StitchError::BufferSize {
                expected: size.volume(),
                actual: data.len(),
            });
        }
        if !range.is_valid() {
            return Err(StitchError::InvalidRange {
                min: range.min,
                max: range.max,
            });
        }
        Ok(Self {
            data,
            size,
            range,
            reference_offset: None,
            estimated_offset: None,
        })
    }

    /// Wrap a voxel buffer and take the range from its finite samples.
    pub fn with_computed_range(size: Size3, data: Vec<f32>) -> Result<Self> {
        let range = Range::of_samples(&data).unwrap_or(Range::new(0.0, 0.0));
        Self::new(size, data, range)
    }

    /// Sample `f(x, y, z)` over the whole grid. The range is computed.
    pub fn from_fn(size: Size3, mut f: impl FnMut(usize, usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(size.volume());
        for z in 0..size.z {
            for y in 0..size.y {
                for x in 0..size.x {
                    data.push(f(x, y, z));
                }
            }
        }
        let range = Range::of_samples(&data).unwrap_or(Range::new(0.0, 0.0));
        Self {
            data,
            size,
            range,
            reference_offset: None,
            estimated_offset: None,
        }
    }

    pub fn size(&self) -> Size3 {
        self.size
    }

    pub fn range(&self) -> Range {
        self.range
    }

    /// Replace the intensity range used by remapping operations.
    pub fn with_range(mut self, range: Range) -> Result<Self> {
        if !range.is_valid() {
            return Err(StitchError::InvalidRange {
                min: range.min,
                max: range.max,
            });
        }
        self.range = range;
        Ok(self)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.size.layer_len() + y * self.size.x + x
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.index(x, y, z)]
    }

    #[inline]
    pub fn at_mut(&mut self, x: usize, y: usize, z: usize) -> &mut f32 {
        let i = self.index(x, y, z);
        &mut self.data[i]
    }

    /// Contiguous samples of layer `z`.
    pub fn layer(&self, z: usize) -> &[f32] {
        let len = self.size.layer_len();
        &self.data[z * len..(z + 1) * len]
    }

    /// Ground-truth placement from scan metadata, if any. Debug use only.
    pub fn reference_offset(&self) -> Option<Offset3> {
        self.reference_offset
    }

    pub fn with_reference_offset(mut self, offset: Option<Offset3>) -> Self {
        self.reference_offset = offset;
        self
    }

    /// Placement relative to the previous volume, recorded by a stitch.
    pub fn estimated_offset(&self) -> Option<Offset3> {
        self.estimated_offset
    }

    pub fn set_estimated_offset(&mut self, offset: Option<Offset3>) {
        self.estimated_offset = offset;
    }

    /// Copy of layers `z0..z1` with the same range and no offset metadata.
    pub fn slab(&self, z0: usize, z1: usize) -> Result<VoxelVolume> {
        if z0 > z1 || z1 > self.size.z {
            return Err(StitchError::SliceOutOfRange {
                plane: Plane::Transverse,
                index: z1.max(z0),
                extent: self.size.z,
            });
        }
        let len = self.size.layer_len();
        let data = self.data[z0 * len..z1 * len].to_vec();
        VoxelVolume::new(Size3::new(self.size.x, self.size.y, z1 - z0), data, self.range)
    }

    /// Float copy remapped from the volume range into `[0, 1]`.
    pub fn normalized(&self) -> VolumeF32 {
        let data = self
            .data
            .iter()
            .map(|&v| self.range.fit(v, Range::UNIT))
            .collect();
        VolumeF32 {
            w: self.size.x,
            h: self.size.y,
            d: self.size.z,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_rejects_wrong_buffer_length() {
        let err = VoxelVolume::new(Size3::new(2, 2, 2), vec![0.0; 7], Range::U8).unwrap_err();
        assert!(
            matches!(
                err,
                StitchError::BufferSize {
                    expected: 8,
                    actual: 7
                }
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn construction_rejects_inverted_range() {
        let err =
            VoxelVolume::new(Size3::new(1, 1, 1), vec![0.0], Range::new(2.0, 1.0)).unwrap_err();
        assert!(matches!(err, StitchError::InvalidRange { .. }));
    }

    #[test]
    fn indexing_is_layer_major() {
        let vol = VoxelVolume::from_fn(Size3::new(3, 4, 5), |x, y, z| (x + 10 * y + 100 * z) as f32);
        assert_eq!(vol.data()[vol.index(2, 1, 3)], 312.0);
        assert_eq!(vol.at(0, 3, 4), 430.0);
        assert_eq!(vol.range(), Range::new(0.0, 432.0));
        assert_eq!(vol.layer(1)[0], 100.0);
    }

    #[test]
    fn slab_copies_layers_and_checks_bounds() {
        let vol = VoxelVolume::from_fn(Size3::new(2, 2, 6), |_, _, z| z as f32);
        let slab = vol.slab(2, 5).unwrap();
        assert_eq!(slab.size(), Size3::new(2, 2, 3));
        assert_eq!(slab.at(1, 1, 0), 2.0);
        assert_eq!(slab.at(0, 0, 2), 4.0);
        assert!(vol.slab(4, 7).is_err());
    }

    #[test]
    fn normalized_maps_range_to_unit_interval() {
        let vol = VoxelVolume::new(Size3::new(2, 1, 1), vec![10.0, 30.0], Range::new(10.0, 30.0))
            .unwrap();
        let norm = vol.normalized();
        assert_eq!(norm.data, vec![0.0, 1.0]);
    }
}
