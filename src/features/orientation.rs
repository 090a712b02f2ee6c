//! Dominant gradient orientations for planar keypoints.
//!
//! Gradient magnitudes inside a circular window of radius `3σ` vote into 36
//! bins, weighted by a Gaussian of `σ = 1.5·size / 2^(octave+1)`. The
//! strongest local peak and every other local peak reaching
//! `peak_ratio × max` each yield one angle, refined by a parabola through the
//! peak bin and its neighbours.
use super::gradient::{wrap_angle, Grad};
use super::keypoint::Keypoint;
use crate::pyramid::octave_scale;
use std::f32::consts::TAU;

pub const ORIENTATION_BINS: usize = 36;

/// Accumulate the weighted orientation histogram around `(cx, cy)`.
pub fn orientation_histogram(grad: &Grad, cx: f32, cy: f32, sigma: f32) -> [f32; ORIENTATION_BINS] {
    let mut hist = [0.0f32; ORIENTATION_BINS];
    let (w, h) = (grad.mag.w as isize, grad.mag.h as isize);
    let radius = (3.0 * sigma).round() as isize;
    let (px, py) = (cx.round() as isize, cy.round() as isize);
    let denom = 2.0 * sigma * sigma;

    for dy in -radius..=radius {
        let y = py + dy;
        if y < 1 || y >= h - 1 {
            continue;
        }
        for dx in -radius..=radius {
            let x = px + dx;
            if x < 1 || x >= w - 1 || dx * dx + dy * dy > radius * radius {
                continue;
            }
            let weight = (-((dx * dx + dy * dy) as f32) / denom).exp();
            let (xu, yu) = (x as usize, y as usize);
            let bin = (grad.ori.get(xu, yu) * ORIENTATION_BINS as f32 / TAU) as usize
                % ORIENTATION_BINS;
            hist[bin] += weight * grad.mag.get(xu, yu);
        }
    }
    hist
}

/// Angles of the histogram peaks at or above `peak_ratio × max`.
///
/// A bin is a peak when it exceeds its left neighbour and is not below its
/// right neighbour, so a two-bin plateau yields one angle. An empty or
/// uniform histogram yields the centre of the strongest bin.
pub fn dominant_orientations(hist: &[f32; ORIENTATION_BINS], peak_ratio: f32) -> Vec<f32> {
    let (argmax, max) = hist
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, v)| if v > best.1 { (i, v) } else { best });
    let bin_width = TAU / ORIENTATION_BINS as f32;

    let mut angles = Vec::new();
    if max > 0.0 {
        for i in 0..ORIENTATION_BINS {
            let c = hist[i];
            let l = hist[(i + ORIENTATION_BINS - 1) % ORIENTATION_BINS];
            let r = hist[(i + 1) % ORIENTATION_BINS];
            if c > l && c >= r && c >= peak_ratio * max {
                let denom = l - 2.0 * c + r;
                let offset = if denom.abs() > f32::EPSILON {
                    (0.5 * (l - r) / denom).clamp(-0.5, 0.5)
                } else {
                    0.0
                };
                angles.push(wrap_angle((i as f32 + 0.5 + offset) * bin_width));
            }
        }
    }
    if angles.is_empty() {
        angles.push((argmax as f32 + 0.5) * bin_width);
    }
    angles
}

/// Push one copy of `kp` per dominant orientation into `out`.
pub fn assign_orientations(kp: Keypoint, grad: &Grad, peak_ratio: f32, out: &mut Vec<Keypoint>) {
    let sigma = 1.5 * kp.size / (2.0 * octave_scale(kp.octave));
    let (cx, cy) = kp.octave_position();
    let hist = orientation_histogram(grad, cx, cy, sigma);
    for angle in dominant_orientations(&hist, peak_ratio) {
        out.push(Keypoint { angle, ..kp });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::gradient::central_gradients;
    use crate::image::ImageF32;

    #[test]
    fn ramp_orientation_follows_gradient_direction() {
        let alpha = 0.7f32;
        let mut img = ImageF32::new(41, 41);
        for y in 0..41 {
            for x in 0..41 {
                img.set(x, y, x as f32 * alpha.cos() + y as f32 * alpha.sin());
            }
        }
        let grad = central_gradients(&img);
        let hist = orientation_histogram(&grad, 20.0, 20.0, 3.0);
        let angles = dominant_orientations(&hist, 0.8);
        assert_eq!(angles.len(), 1, "angles={angles:?}");
        let bin_width = TAU / ORIENTATION_BINS as f32;
        assert!(
            (angles[0] - alpha).abs() < bin_width,
            "angle {} too far from {}",
            angles[0],
            alpha
        );
    }

    #[test]
    fn strong_secondary_peak_spawns_clone() {
        let mut hist = [0.0f32; ORIENTATION_BINS];
        hist[3] = 10.0;
        hist[20] = 9.0;
        hist[30] = 5.0;
        let angles = dominant_orientations(&hist, 0.8);
        assert_eq!(angles.len(), 2);
        let bin_width = TAU / ORIENTATION_BINS as f32;
        assert!((angles[0] - 3.5 * bin_width).abs() < 1e-5);
        assert!((angles[1] - 20.5 * bin_width).abs() < 1e-5);
    }

    #[test]
    fn parabolic_offset_leans_toward_heavier_neighbour() {
        let mut hist = [0.0f32; ORIENTATION_BINS];
        hist[9] = 4.0;
        hist[10] = 10.0;
        hist[11] = 8.0;
        let angles = dominant_orientations(&hist, 0.8);
        let bin_width = TAU / ORIENTATION_BINS as f32;
        assert_eq!(angles.len(), 1);
        assert!(angles[0] > 10.5 * bin_width && angles[0] < 11.0 * bin_width);
    }

    #[test]
    fn empty_histogram_gives_single_angle() {
        let hist = [0.0f32; ORIENTATION_BINS];
        assert_eq!(dominant_orientations(&hist, 0.8).len(), 1);
    }
}
