//! Owned single-channel f32 volume, layer-major (`z·w·h + y·w + x`).
//!
//! Used for the volumetric scale space. Each Z layer is a contiguous
//! `w × h` image, so layer-wise work can borrow rows directly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VolumeF32 {
    /// Extent along X
    pub w: usize,
    /// Extent along Y
    pub h: usize,
    /// Extent along Z
    pub d: usize,
    /// Backing storage, layer-major
    pub data: Vec<f32>,
}

impl VolumeF32 {
    /// Construct a zero-initialized volume of size `w × h × d`.
    pub fn new(w: usize, h: usize, d: usize) -> Self {
        Self {
            w,
            h,
            d,
            data: vec![0.0; w * h * d],
        }
    }

    #[inline]
    pub fn layer_len(&self) -> usize {
        self.w * self.h
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.w * self.h + y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, v: f32) {
        let i = self.idx(x, y, z);
        self.data[i] = v;
    }

    /// Contiguous samples of layer `z`.
    pub fn layer(&self, z: usize) -> &[f32] {
        let len = self.layer_len();
        &self.data[z * len..(z + 1) * len]
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0 || self.d == 0
    }

    /// Smallest of the three extents.
    pub fn min_extent(&self) -> usize {
        self.w.min(self.h).min(self.d)
    }
}
