//! Central-difference gradients with magnitude and full-circle orientation.
//!
//! - `gx = (I(x+1) − I(x−1)) / 2`, `gy` likewise, with border clamping.
//! - Caches `mag = sqrt(gx² + gy²)` and `ori = atan2(gy, gx)` wrapped into
//!   `[0, 2π)` so orientation histograms and descriptors share one pass.
//!
//! Complexity: O(W·H) per layer; memory: four float buffers.
use crate::image::{ImageF32, ImageView, ImageViewMut, VolumeF32};
use std::f32::consts::TAU;

/// Per-pixel gradient buffers.
#[derive(Clone, Debug)]
pub struct Grad {
    /// Horizontal derivative
    pub gx: ImageF32,
    /// Vertical derivative
    pub gy: ImageF32,
    /// Euclidean magnitude per pixel
    pub mag: ImageF32,
    /// Orientation in radians, `[0, 2π)`
    pub ori: ImageF32,
}

/// Wrap an angle into `[0, 2π)`.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Compute central-difference gradients on a single-channel float image.
pub fn central_gradients(l: &ImageF32) -> Grad {
    let (w, h) = (l.w, l.h);
    let mut gx = ImageF32::new(w, h);
    let mut gy = ImageF32::new(w, h);
    let mut mag = ImageF32::new(w, h);
    let mut ori = ImageF32::new(w, h);
    if w == 0 || h == 0 {
        return Grad { gx, gy, mag, ori };
    }

    for y in 0..h {
        let up = l.row(y.saturating_sub(1));
        let mid = l.row(y);
        let down = l.row((y + 1).min(h - 1));
        let out_gx = gx.row_mut(y);
        let out_gy = gy.row_mut(y);
        let out_mag = mag.row_mut(y);
        let out_ori = ori.row_mut(y);
        for x in 0..w {
            let dx = 0.5 * (mid[(x + 1).min(w - 1)] - mid[x.saturating_sub(1)]);
            let dy = 0.5 * (down[x] - up[x]);
            out_gx[x] = dx;
            out_gy[x] = dy;
            out_mag[x] = (dx * dx + dy * dy).sqrt();
            out_ori[x] = wrap_angle(dy.atan2(dx));
        }
    }

    Grad { gx, gy, mag, ori }
}

/// Central-difference gradient of a volume at an interior voxel.
#[inline]
pub fn volume_gradient_at(v: &VolumeF32, x: usize, y: usize, z: usize) -> [f32; 3] {
    [
        0.5 * (v.get(x + 1, y, z) - v.get(x - 1, y, z)),
        0.5 * (v.get(x, y + 1, z) - v.get(x, y - 1, z)),
        0.5 * (v.get(x, y, z + 1) - v.get(x, y, z - 1)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_has_constant_gradient() {
        let mut img = ImageF32::new(6, 5);
        for y in 0..5 {
            for x in 0..6 {
                img.set(x, y, 2.0 * x as f32 - y as f32);
            }
        }
        let grad = central_gradients(&img);
        assert_eq!(grad.gx.get(3, 2), 2.0);
        assert_eq!(grad.gy.get(3, 2), -1.0);
        assert!((grad.mag.get(3, 2) - 5f32.sqrt()).abs() < 1e-6);
        let expected = wrap_angle((-1f32).atan2(2.0));
        assert!((grad.ori.get(3, 2) - expected).abs() < 1e-6);
        assert!(grad.ori.get(3, 2) > std::f32::consts::PI);
    }

    #[test]
    fn wrap_angle_stays_in_range() {
        for a in [-7.0f32, -0.1, 0.0, 3.0, TAU, 13.0] {
            let w = wrap_angle(a);
            assert!((0.0..TAU).contains(&w), "{a} -> {w}");
        }
    }
}
