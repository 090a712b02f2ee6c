//! Planar cuts through a voxel volume.
//!
//! | plane        | fixed axis | columns | rows |
//! |--------------|------------|---------|------|
//! | Sagittal     | x          | y       | z    |
//! | Coronal      | y          | x       | z    |
//! | Transverse   | z          | x       | y    |
//! | Diagonal     | -          | i       | z    |
//! | AntiDiagonal | -          | i       | z    |
//!
//! The diagonal planes sample `(i, i)` and `(X−1−i, i)` for `i < min(X, Y)`
//! and ignore the slice index. Slices are produced on demand and not cached.
use super::{Range, Size3, VoxelVolume};
use crate::error::{Result, StitchError};
use crate::image::io::GrayImageU8;
use crate::image::ImageF32;
use serde::{Deserialize, Serialize};

/// Cut orientation. The discriminants match the numeric plane ids used in
/// scan tooling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plane {
    Sagittal = 0,
    Coronal = 1,
    Transverse = 2,
    Diagonal = 3,
    AntiDiagonal = 4,
}

impl Plane {
    pub const ALL: [Plane; 5] = [
        Plane::Sagittal,
        Plane::Coronal,
        Plane::Transverse,
        Plane::Diagonal,
        Plane::AntiDiagonal,
    ];

    pub fn from_id(id: u8) -> Option<Plane> {
        Plane::ALL.get(id as usize).copied()
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Extent of the fixed axis, i.e. the number of valid slice indices.
    /// Diagonal planes accept any index.
    pub fn index_extent(self, size: Size3) -> Option<usize> {
        match self {
            Plane::Sagittal => Some(size.x),
            Plane::Coronal => Some(size.y),
            Plane::Transverse => Some(size.z),
            Plane::Diagonal | Plane::AntiDiagonal => None,
        }
    }

    /// Slice dimensions `(width, height)` for a volume of `size`.
    pub fn slice_dims(self, size: Size3) -> (usize, usize) {
        match self {
            Plane::Sagittal => (size.y, size.z),
            Plane::Coronal => (size.x, size.z),
            Plane::Transverse => (size.x, size.y),
            Plane::Diagonal | Plane::AntiDiagonal => (size.x.min(size.y), size.z),
        }
    }

    /// True when slice rows run along Z.
    pub fn is_vertical(self) -> bool {
        !matches!(self, Plane::Transverse)
    }
}

impl VoxelVolume {
    /// Extract a raw-intensity slice.
    pub fn slice(&self, plane: Plane, index: usize) -> Result<ImageF32> {
        let size = self.size();
        if let Some(extent) = plane.index_extent(size) {
            if index >= extent {
                return Err(StitchError::SliceOutOfRange {
                    plane,
                    index,
                    extent,
                });
            }
        }
        let (w, h) = plane.slice_dims(size);
        let mut out = ImageF32::new(w, h);
        match plane {
            Plane::Sagittal => {
                for z in 0..size.z {
                    for y in 0..size.y {
                        out.set(y, z, self.at(index, y, z));
                    }
                }
            }
            Plane::Coronal => {
                for z in 0..size.z {
                    for x in 0..size.x {
                        out.set(x, z, self.at(x, index, z));
                    }
                }
            }
            Plane::Transverse => {
                out.data.copy_from_slice(self.layer(index));
            }
            Plane::Diagonal => {
                for z in 0..size.z {
                    for i in 0..w {
                        out.set(i, z, self.at(i, i, z));
                    }
                }
            }
            Plane::AntiDiagonal => {
                for z in 0..size.z {
                    for i in 0..w {
                        out.set(i, z, self.at(size.x - 1 - i, i, z));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Extract a slice remapped from the volume range into `target`.
    pub fn slice_fitted(&self, plane: Plane, index: usize, target: Range) -> Result<ImageF32> {
        let mut img = self.slice(plane, index)?;
        let range = self.range();
        for v in img.data.iter_mut() {
            *v = range.fit(*v, target);
        }
        Ok(img)
    }

    /// Extract an 8-bit slice for previews and exports.
    pub fn slice_u8(&self, plane: Plane, index: usize) -> Result<GrayImageU8> {
        let img = self.slice_fitted(plane, index, Range::U8)?;
        let data = img
            .data
            .iter()
            .map(|v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        Ok(GrayImageU8::new(img.w, img.h, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coded_volume() -> VoxelVolume {
        VoxelVolume::from_fn(Size3::new(4, 3, 5), |x, y, z| (x + 10 * y + 100 * z) as f32)
    }

    #[test]
    fn axis_planes_follow_layout_table() {
        let vol = coded_volume();
        let sag = vol.slice(Plane::Sagittal, 2).unwrap();
        assert_eq!((sag.w, sag.h), (3, 5));
        assert_eq!(sag.get(1, 4), 412.0);

        let cor = vol.slice(Plane::Coronal, 1).unwrap();
        assert_eq!((cor.w, cor.h), (4, 5));
        assert_eq!(cor.get(3, 2), 213.0);

        let tra = vol.slice(Plane::Transverse, 3).unwrap();
        assert_eq!((tra.w, tra.h), (4, 3));
        assert_eq!(tra.get(2, 1), 312.0);
    }

    #[test]
    fn diagonal_planes_span_the_short_side() {
        let vol = coded_volume();
        let diag = vol.slice(Plane::Diagonal, 0).unwrap();
        assert_eq!((diag.w, diag.h), (3, 5));
        assert_eq!(diag.get(2, 1), 122.0);

        let anti = vol.slice(Plane::AntiDiagonal, 99).unwrap();
        assert_eq!(anti.get(0, 0), 3.0);
        assert_eq!(anti.get(2, 0), 21.0);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let vol = coded_volume();
        let err = vol.slice(Plane::Coronal, 3).unwrap_err();
        assert!(
            matches!(
                err,
                StitchError::SliceOutOfRange {
                    plane: Plane::Coronal,
                    index: 3,
                    extent: 3
                }
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn transverse_slice_round_trips_layer() {
        let vol = coded_volume();
        let slice = vol.slice(Plane::Transverse, 2).unwrap();
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(slice.get(x, y), vol.data()[vol.index(x, y, 2)]);
            }
        }
    }

    #[test]
    fn u8_slice_spans_full_range() {
        let vol = coded_volume();
        let slice = vol.slice_u8(Plane::Sagittal, 0).unwrap();
        assert_eq!(slice.width(), 3);
        assert_eq!(slice.as_raw()[0], 0);
        let top = vol.slice_u8(Plane::Sagittal, 3).unwrap();
        assert_eq!(*top.as_raw().last().unwrap(), 255);
    }

    #[test]
    fn plane_ids_round_trip() {
        for plane in Plane::ALL {
            assert_eq!(Plane::from_id(plane.id()), Some(plane));
        }
        assert_eq!(Plane::from_id(5), None);
    }
}
