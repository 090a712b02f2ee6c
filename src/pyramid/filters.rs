//! Separable Gaussian filtering and stride-2 decimation for 2D and 3D buffers.
//!
//! A 3D Gaussian is the product of three 1D Gaussians, so the volumetric blur
//! runs as X, Y and Z passes of the same normalized taps. Border samples clamp
//! to the buffer extents. With the `parallel` feature the passes split the
//! output into independent rows or layers; every output sample is computed
//! the same way in both builds.
use crate::image::{ImageF32, ImageView, ImageViewMut, VolumeF32};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Trait implemented by separable 1D filters used for scale-space construction.
pub trait SeparableFilter: Sync {
    /// Return the 1D taps (in left-to-right order). The kernel is assumed to be
    /// symmetric around its centre, but the implementation does not rely on it.
    fn taps(&self) -> &[f32];

    fn radius(&self) -> usize {
        self.taps().len() / 2
    }
}

/// Sum-normalized sampled Gaussian.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianKernel {
    sigma: f32,
    taps: Vec<f32>,
}

impl GaussianKernel {
    /// Build taps over `[-r, r]` with `r = max(1, ceil(radius_factor·σ))`.
    pub fn new(sigma: f32, radius_factor: f32) -> Self {
        let radius = ((radius_factor * sigma).ceil() as usize).max(1);
        let denom = 2.0 * sigma * sigma;
        let mut taps: Vec<f32> = (0..=2 * radius)
            .map(|i| {
                let d = i as f32 - radius as f32;
                if denom > 0.0 {
                    (-d * d / denom).exp()
                } else if i == radius {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let sum: f32 = taps.iter().sum();
        for t in &mut taps {
            *t /= sum;
        }
        Self { sigma, taps }
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }
}

impl SeparableFilter for GaussianKernel {
    #[inline]
    fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Blur an image with `filter` along X then Y.
pub fn blur_image(src: &ImageF32, filter: &dyn SeparableFilter) -> ImageF32 {
    if src.is_empty() {
        return src.clone();
    }
    let taps = filter.taps();
    let mut horiz = ImageF32::new(src.w, src.h);
    filter_rows(&src.data, &mut horiz.data, src.w, taps);
    let mut out = ImageF32::new(src.w, src.h);
    filter_blocks(&horiz.data, &mut out.data, src.w, taps);
    out
}

/// Blur a volume with `filter` along X, Y and Z.
pub fn blur_volume(src: &VolumeF32, filter: &dyn SeparableFilter) -> VolumeF32 {
    if src.is_empty() {
        return src.clone();
    }
    let taps = filter.taps();
    let layer_len = src.layer_len();

    let mut along_x = VolumeF32::new(src.w, src.h, src.d);
    filter_rows(&src.data, &mut along_x.data, src.w, taps);

    let mut along_y = VolumeF32::new(src.w, src.h, src.d);
    for (src_layer, dst_layer) in along_x
        .data
        .chunks(layer_len)
        .zip(along_y.data.chunks_mut(layer_len))
    {
        filter_blocks(src_layer, dst_layer, src.w, taps);
    }

    let mut out = VolumeF32::new(src.w, src.h, src.d);
    filter_blocks(&along_y.data, &mut out.data, layer_len, taps);
    out
}

/// Keep every second sample along X and Y; output is `ceil(w/2) × ceil(h/2)`.
pub fn half_sample_image(src: &ImageF32) -> ImageF32 {
    let mut dst = ImageF32::new(src.w.div_ceil(2), src.h.div_ceil(2));
    for y in 0..dst.h {
        let src_row = src.row(2 * y);
        for (x, px) in dst.row_mut(y).iter_mut().enumerate() {
            *px = src_row[2 * x];
        }
    }
    dst
}

/// Keep every second sample along X, Y and Z.
pub fn half_sample_volume(src: &VolumeF32) -> VolumeF32 {
    let mut dst = VolumeF32::new(src.w.div_ceil(2), src.h.div_ceil(2), src.d.div_ceil(2));
    for z in 0..dst.d {
        for y in 0..dst.h {
            for x in 0..dst.w {
                let v = src.get(2 * x, 2 * y, 2 * z);
                dst.set(x, y, z, v);
            }
        }
    }
    dst
}

/// Convolve every contiguous row of `row_len` samples.
fn filter_rows(src: &[f32], dst: &mut [f32], row_len: usize, taps: &[f32]) {
    #[cfg(feature = "parallel")]
    dst.par_chunks_mut(row_len)
        .zip(src.par_chunks(row_len))
        .for_each(|(out, row)| filter_line(row, out, taps));

    #[cfg(not(feature = "parallel"))]
    dst.chunks_mut(row_len)
        .zip(src.chunks(row_len))
        .for_each(|(out, row)| filter_line(row, out, taps));
}

fn filter_line(row: &[f32], out: &mut [f32], taps: &[f32]) {
    let radius = taps.len() / 2;
    let n = row.len();
    for (x, dst_px) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for (k, &tap) in taps.iter().enumerate() {
            let idx = clamp_index(x as isize + k as isize - radius as isize, n);
            acc += tap * row[idx];
        }
        *dst_px = acc;
    }
}

/// Convolve across consecutive blocks of `block_len` samples: output block `i`
/// is the tap-weighted sum of input blocks `i - r ..= i + r`, clamped.
fn filter_blocks(src: &[f32], dst: &mut [f32], block_len: usize, taps: &[f32]) {
    let blocks = src.len() / block_len;
    let apply = |(i, out): (usize, &mut [f32])| {
        let radius = taps.len() / 2;
        out.fill(0.0);
        for (k, &tap) in taps.iter().enumerate() {
            let j = clamp_index(i as isize + k as isize - radius as isize, blocks);
            let block = &src[j * block_len..(j + 1) * block_len];
            for (o, &s) in out.iter_mut().zip(block) {
                *o += tap * s;
            }
        }
    };

    #[cfg(feature = "parallel")]
    dst.par_chunks_mut(block_len).enumerate().for_each(apply);

    #[cfg(not(feature = "parallel"))]
    dst.chunks_mut(block_len).enumerate().for_each(apply);
}

#[inline]
pub(crate) fn clamp_index(idx: isize, upper: usize) -> usize {
    if upper == 0 {
        return 0;
    }
    if idx < 0 {
        0
    } else if (idx as usize) >= upper {
        upper - 1
    } else {
        idx as usize
    }
}
