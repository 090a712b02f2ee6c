//! Gradient-histogram descriptors.
//!
//! Planar: a 4×4 grid of cells, 4 samples wide, each with 8 orientation bins,
//! rotated into the keypoint frame. Volumetric: a 2×2×2 grid of cells,
//! 4 voxels wide, each with 8 azimuth bins per elevation hemisphere. Both
//! spread every sample over neighbouring cells and bins by linear weights,
//! apply a Gaussian falloff of half the window width, then normalize, clip at
//! 0.2 and renormalize.
use super::gradient::{volume_gradient_at, wrap_angle, Grad};
use super::keypoint::{Descriptor, Keypoint, VolumeKeypoint, DESCRIPTOR_LEN};
use crate::image::VolumeF32;
use std::f32::consts::TAU;

const PLANAR_CELLS: usize = 4;
const PLANAR_BINS: usize = 8;
const VOLUME_CELLS: usize = 2;
const AZIMUTH_BINS: usize = 8;
const VOLUME_BINS: usize = 2 * AZIMUTH_BINS;
const CELL_WIDTH: f32 = 4.0;
const CLIP: f32 = 0.2;

/// Describe a planar keypoint from the gradients of its Gaussian layer.
pub fn describe_planar(kp: &Keypoint, grad: &Grad) -> Descriptor {
    let mut hist = [0.0f32; DESCRIPTOR_LEN];
    let d = PLANAR_CELLS as f32;
    let (w, h) = (grad.mag.w as isize, grad.mag.h as isize);
    let (ox, oy) = kp.octave_position();
    let (px, py) = (ox.round() as isize, oy.round() as isize);
    let (sin_t, cos_t) = kp.angle.sin_cos();
    let radius = (CELL_WIDTH * (d + 1.0) * std::f32::consts::SQRT_2 * 0.5).round() as isize;
    let falloff = 2.0 * (0.5 * d) * (0.5 * d);

    for i in -radius..=radius {
        let y = py + i;
        if y < 1 || y >= h - 1 {
            continue;
        }
        for j in -radius..=radius {
            let x = px + j;
            if x < 1 || x >= w - 1 {
                continue;
            }
            // Sample offset rotated by -angle, in cell units.
            let c_rot = (j as f32 * cos_t + i as f32 * sin_t) / CELL_WIDTH;
            let r_rot = (-(j as f32) * sin_t + i as f32 * cos_t) / CELL_WIDTH;
            let cbin = c_rot + 0.5 * d - 0.5;
            let rbin = r_rot + 0.5 * d - 0.5;
            if cbin <= -1.0 || cbin >= d || rbin <= -1.0 || rbin >= d {
                continue;
            }
            let (xu, yu) = (x as usize, y as usize);
            let weight = (-(c_rot * c_rot + r_rot * r_rot) / falloff).exp();
            let mag = grad.mag.get(xu, yu) * weight;
            let theta = wrap_angle(grad.ori.get(xu, yu) - kp.angle);
            let obin = theta * PLANAR_BINS as f32 / TAU;
            accumulate_planar(&mut hist, rbin, cbin, obin, mag);
        }
    }
    normalize_descriptor(&mut hist);
    hist
}

fn accumulate_planar(hist: &mut Descriptor, rbin: f32, cbin: f32, obin: f32, mag: f32) {
    let (r0, c0, o0) = (rbin.floor(), cbin.floor(), obin.floor());
    let (dr, dc, dor) = (rbin - r0, cbin - c0, obin - o0);
    let (r0, c0, o0) = (r0 as isize, c0 as isize, o0 as isize);
    for (ri, rw) in [(r0, 1.0 - dr), (r0 + 1, dr)] {
        if ri < 0 || ri >= PLANAR_CELLS as isize {
            continue;
        }
        for (ci, cw) in [(c0, 1.0 - dc), (c0 + 1, dc)] {
            if ci < 0 || ci >= PLANAR_CELLS as isize {
                continue;
            }
            for (oi, ow) in [(o0, 1.0 - dor), (o0 + 1, dor)] {
                let ob = oi.rem_euclid(PLANAR_BINS as isize) as usize;
                let idx = (ri as usize * PLANAR_CELLS + ci as usize) * PLANAR_BINS + ob;
                hist[idx] += mag * rw * cw * ow;
            }
        }
    }
}

/// Describe a volumetric keypoint from its Gaussian layer.
pub fn describe_volumetric(kp: &VolumeKeypoint, gauss: &VolumeF32) -> Descriptor {
    let mut hist = [0.0f32; DESCRIPTOR_LEN];
    let d = VOLUME_CELLS as f32;
    let (ox, oy, oz) = kp.octave_position();
    let centre = [ox.round() as isize, oy.round() as isize, oz.round() as isize];
    let extent = [gauss.w as isize, gauss.h as isize, gauss.d as isize];
    let radius = (CELL_WIDTH * (d + 1.0) * 0.5).round() as isize;
    let falloff = 2.0 * (0.5 * d) * (0.5 * d);

    for k in -radius..=radius {
        for i in -radius..=radius {
            for j in -radius..=radius {
                let p = [centre[0] + j, centre[1] + i, centre[2] + k];
                if (0..3).any(|a| p[a] < 1 || p[a] >= extent[a] - 1) {
                    continue;
                }
                let cell = [
                    j as f32 / CELL_WIDTH,
                    i as f32 / CELL_WIDTH,
                    k as f32 / CELL_WIDTH,
                ];
                let bins = cell.map(|c| c + 0.5 * d - 0.5);
                if bins.iter().any(|&b| b <= -1.0 || b >= d) {
                    continue;
                }
                let g = volume_gradient_at(gauss, p[0] as usize, p[1] as usize, p[2] as usize);
                let mag = (g[0] * g[0] + g[1] * g[1] + g[2] * g[2]).sqrt();
                if mag == 0.0 {
                    continue;
                }
                let weight = (-(cell[0] * cell[0] + cell[1] * cell[1] + cell[2] * cell[2])
                    / falloff)
                    .exp();
                let azimuth = wrap_angle(g[1].atan2(g[0])) * AZIMUTH_BINS as f32 / TAU;
                let hemisphere = usize::from(g[2] < 0.0);
                accumulate_volumetric(&mut hist, bins, azimuth, hemisphere, mag * weight);
            }
        }
    }
    normalize_descriptor(&mut hist);
    hist
}

fn accumulate_volumetric(
    hist: &mut Descriptor,
    bins: [f32; 3],
    azimuth: f32,
    hemisphere: usize,
    mag: f32,
) {
    let floor = bins.map(f32::floor);
    let a0 = azimuth.floor();
    let da = azimuth - a0;
    let cells = VOLUME_CELLS as isize;
    for corner in 0..8 {
        let mut weight = mag;
        let mut idx = [0usize; 3];
        let mut inside = true;
        for axis in 0..3 {
            let upper = (corner >> axis) & 1 == 1;
            let frac = bins[axis] - floor[axis];
            let pos = floor[axis] as isize + isize::from(upper);
            if pos < 0 || pos >= cells {
                inside = false;
                break;
            }
            idx[axis] = pos as usize;
            weight *= if upper { frac } else { 1.0 - frac };
        }
        if !inside {
            continue;
        }
        let cell = (idx[2] * VOLUME_CELLS + idx[1]) * VOLUME_CELLS + idx[0];
        let base = cell * VOLUME_BINS + hemisphere * AZIMUTH_BINS;
        for (ai, aw) in [(a0 as isize, 1.0 - da), (a0 as isize + 1, da)] {
            let ab = ai.rem_euclid(AZIMUTH_BINS as isize) as usize;
            hist[base + ab] += weight * aw;
        }
    }
}

/// Unit L2 norm, clip each entry at 0.2, renormalize. Zero stays zero.
pub fn normalize_descriptor(desc: &mut Descriptor) {
    let norm = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        desc.fill(0.0);
        return;
    }
    for v in desc.iter_mut() {
        *v = (*v / norm).min(CLIP);
    }
    let norm = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in desc.iter_mut() {
            *v /= norm;
        }
    }
}
