//! Scale-space extremum detection.
//!
//! A sample of a middle DoG layer is a candidate when it is `>=` every
//! neighbour (maximum) or `<=` every neighbour (minimum) across its own layer
//! and the two adjacent ones: 26 neighbours in 2D, 80 in 3D. Ties count as
//! extremal; plateaus are left for localization to discard. Only interior
//! samples are tested.
use crate::image::{ImageF32, VolumeF32};

/// Planar candidate in octave-local sample coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub octave: usize,
    pub layer: usize,
    pub x: usize,
    pub y: usize,
}

/// Volumetric candidate in octave-local sample coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolumeCandidate {
    pub octave: usize,
    pub layer: usize,
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

/// Append the extrema of one octave's DoG stack to `out`.
pub fn detect_planar(dogs: &[ImageF32], octave: usize, floor: f32, out: &mut Vec<Candidate>) {
    if dogs.len() < 3 {
        return;
    }
    let (w, h) = (dogs[0].w, dogs[0].h);
    if w < 3 || h < 3 {
        return;
    }
    for layer in 1..dogs.len() - 1 {
        let stack = [&dogs[layer - 1], &dogs[layer], &dogs[layer + 1]];
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let v = stack[1].get(x, y);
                if v.abs() < floor {
                    continue;
                }
                let mut is_max = true;
                let mut is_min = true;
                'scan: for img in stack {
                    for ny in y - 1..=y + 1 {
                        for nx in x - 1..=x + 1 {
                            let n = img.get(nx, ny);
                            is_max &= v >= n;
                            is_min &= v <= n;
                            if !is_max && !is_min {
                                break 'scan;
                            }
                        }
                    }
                }
                if is_max || is_min {
                    out.push(Candidate {
                        octave,
                        layer,
                        x,
                        y,
                    });
                }
            }
        }
    }
}

/// Append the extrema of one octave's volumetric DoG stack to `out`.
pub fn detect_volumetric(
    dogs: &[VolumeF32],
    octave: usize,
    floor: f32,
    out: &mut Vec<VolumeCandidate>,
) {
    if dogs.len() < 3 {
        return;
    }
    let (w, h, d) = (dogs[0].w, dogs[0].h, dogs[0].d);
    if w < 3 || h < 3 || d < 3 {
        return;
    }
    for layer in 1..dogs.len() - 1 {
        let stack = [&dogs[layer - 1], &dogs[layer], &dogs[layer + 1]];
        for z in 1..d - 1 {
            for y in 1..h - 1 {
                for x in 1..w - 1 {
                    let v = stack[1].get(x, y, z);
                    if v.abs() < floor {
                        continue;
                    }
                    if is_volumetric_extremum(&stack, x, y, z, v) {
                        out.push(VolumeCandidate {
                            octave,
                            layer,
                            x,
                            y,
                            z,
                        });
                    }
                }
            }
        }
    }
}

fn is_volumetric_extremum(
    stack: &[&VolumeF32; 3],
    x: usize,
    y: usize,
    z: usize,
    v: f32,
) -> bool {
    let mut is_max = true;
    let mut is_min = true;
    for vol in stack {
        for nz in z - 1..=z + 1 {
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    let n = vol.get(nx, ny, nz);
                    is_max &= v >= n;
                    is_min &= v <= n;
                    if !is_max && !is_min {
                        return false;
                    }
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_with_peak(w: usize, h: usize, px: usize, py: usize) -> Vec<ImageF32> {
        (0..3)
            .map(|layer| {
                let mut img = ImageF32::new(w, h);
                for y in 0..h {
                    for x in 0..w {
                        let d2 = (x as f32 - px as f32).powi(2) + (y as f32 - py as f32).powi(2);
                        let amp = if layer == 1 { 1.0 } else { 0.4 };
                        img.set(x, y, amp * (-d2 / 8.0).exp() + 0.001 * x as f32);
                    }
                }
                img
            })
            .collect()
    }

    #[test]
    fn single_peak_yields_single_maximum() {
        let dogs = stack_with_peak(15, 13, 7, 6);
        let mut out = Vec::new();
        detect_planar(&dogs, 0, 0.0, &mut out);
        let maxima: Vec<_> = out.iter().filter(|c| c.x == 7 && c.y == 6).collect();
        assert_eq!(maxima.len(), 1, "candidates: {out:?}");
        assert_eq!(maxima[0].layer, 1);
    }

    #[test]
    fn plateau_counts_as_extremum() {
        let dogs: Vec<ImageF32> = (0..3).map(|_| ImageF32::new(4, 4)).collect();
        let mut out = Vec::new();
        detect_planar(&dogs, 2, 0.0, &mut out);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|c| c.octave == 2));

        let mut floored = Vec::new();
        detect_planar(&dogs, 0, 1e-3, &mut floored);
        assert!(floored.is_empty());
    }

    #[test]
    fn volumetric_peak_is_found() {
        let mut dogs: Vec<VolumeF32> = (0..3).map(|_| VolumeF32::new(7, 7, 7)).collect();
        dogs[1].set(3, 4, 2, 1.0);
        for vol in &mut dogs {
            for (i, v) in vol.data.iter_mut().enumerate() {
                *v += i as f32 * 1e-4;
            }
        }
        let mut out = Vec::new();
        detect_volumetric(&dogs, 0, 0.0, &mut out);
        assert!(out.contains(&VolumeCandidate {
            octave: 0,
            layer: 1,
            x: 3,
            y: 4,
            z: 2
        }));
    }
}
