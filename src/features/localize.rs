//! Sub-sample refinement of extremum candidates.
//!
//! Each step fits a quadratic to the DoG stack around the current integer
//! sample (central differences) and solves `H·shift = −g`. A shift of half a
//! sample or more on any axis moves the sample and repeats. Once the shift is
//! below half a sample everywhere the point is tested for contrast and for
//! edge-like curvature and then accepted. Leaving the interior, hitting a
//! singular Hessian or exhausting the step budget drops the candidate.
use super::detect::{Candidate, VolumeCandidate};
use super::keypoint::{keypoint_size, Keypoint, VolumeKeypoint};
use super::params::SiftParams;
use crate::image::{ImageF32, VolumeF32};
use crate::pyramid::octave_scale;
use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};
use serde::Serialize;

/// Reason a candidate did not become a keypoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Rejection {
    Singular,
    OutOfBounds,
    Unconverged,
    LowContrast,
    Edge,
}

/// Refine a planar candidate against its octave's DoG stack.
pub fn localize_planar(
    dogs: &[ImageF32],
    cand: Candidate,
    params: &SiftParams,
) -> Result<Keypoint, Rejection> {
    let levels = params.scale_space.levels;
    let w = dogs[0].w as isize;
    let h = dogs[0].h as isize;
    let last_layer = dogs.len() as isize - 2;
    let (mut x, mut y, mut s) = (cand.x as isize, cand.y as isize, cand.layer as isize);

    for _ in 0..params.max_refine_steps {
        let (xu, yu, su) = (x as usize, y as usize, s as usize);
        let (prev, cur, next) = (&dogs[su - 1], &dogs[su], &dogs[su + 1]);
        let v = cur.get(xu, yu);

        let g = Vector3::new(
            0.5 * (cur.get(xu + 1, yu) - cur.get(xu - 1, yu)),
            0.5 * (cur.get(xu, yu + 1) - cur.get(xu, yu - 1)),
            0.5 * (next.get(xu, yu) - prev.get(xu, yu)),
        );
        let dxx = cur.get(xu + 1, yu) + cur.get(xu - 1, yu) - 2.0 * v;
        let dyy = cur.get(xu, yu + 1) + cur.get(xu, yu - 1) - 2.0 * v;
        let dss = next.get(xu, yu) + prev.get(xu, yu) - 2.0 * v;
        let dxy = 0.25
            * (cur.get(xu + 1, yu + 1) - cur.get(xu - 1, yu + 1) - cur.get(xu + 1, yu - 1)
                + cur.get(xu - 1, yu - 1));
        let dxs = 0.25
            * (next.get(xu + 1, yu) - next.get(xu - 1, yu) - prev.get(xu + 1, yu)
                + prev.get(xu - 1, yu));
        let dys = 0.25
            * (next.get(xu, yu + 1) - next.get(xu, yu - 1) - prev.get(xu, yu + 1)
                + prev.get(xu, yu - 1));

        let hess = Matrix3::new(dxx, dxy, dxs, dxy, dyy, dys, dxs, dys, dss);
        let shift = hess
            .lu()
            .solve(&(-g))
            .filter(|s| s.iter().all(|c| c.is_finite()))
            .ok_or(Rejection::Singular)?;

        if shift.iter().all(|c| c.abs() < 0.5) {
            let response = v + 0.5 * g.dot(&shift);
            if response.abs() * (levels as f32) < params.contrast_threshold {
                return Err(Rejection::LowContrast);
            }
            let r = params.edge_ratio;
            let tr = dxx + dyy;
            let det = dxx * dyy - dxy * dxy;
            if det <= 0.0 || tr * tr * r >= (r + 1.0) * (r + 1.0) * det {
                return Err(Rejection::Edge);
            }
            let spacing = octave_scale(cand.octave);
            let scale = s as f32 + shift.z;
            return Ok(Keypoint {
                x: (x as f32 + shift.x) * spacing,
                y: (y as f32 + shift.y) * spacing,
                octave: cand.octave,
                layer: su,
                scale,
                size: keypoint_size(params.scale_space.sigma, levels, cand.octave, scale),
                angle: 0.0,
                response,
            });
        }

        x += shift.x.round() as isize;
        y += shift.y.round() as isize;
        s += shift.z.round() as isize;
        if x < 1 || x >= w - 1 || y < 1 || y >= h - 1 || s < 1 || s > last_layer {
            return Err(Rejection::OutOfBounds);
        }
    }
    Err(Rejection::Unconverged)
}

/// Refine a volumetric candidate against its octave's DoG stack.
///
/// The edge test requires the spatial Hessian to be definite with an
/// eigenvalue magnitude ratio of at most `edge_ratio`.
pub fn localize_volumetric(
    dogs: &[VolumeF32],
    cand: VolumeCandidate,
    params: &SiftParams,
) -> Result<VolumeKeypoint, Rejection> {
    let levels = params.scale_space.levels;
    let (w, h, d) = (dogs[0].w as isize, dogs[0].h as isize, dogs[0].d as isize);
    let last_layer = dogs.len() as isize - 2;
    let (mut x, mut y, mut z, mut s) = (
        cand.x as isize,
        cand.y as isize,
        cand.z as isize,
        cand.layer as isize,
    );

    for _ in 0..params.max_refine_steps {
        let (xu, yu, zu, su) = (x as usize, y as usize, z as usize, s as usize);
        let (prev, cur, next) = (&dogs[su - 1], &dogs[su], &dogs[su + 1]);
        let at = |vol: &VolumeF32, dx: isize, dy: isize, dz: isize| {
            vol.get(
                (x + dx) as usize,
                (y + dy) as usize,
                (z + dz) as usize,
            )
        };
        let v = cur.get(xu, yu, zu);

        let g = Vector4::new(
            0.5 * (at(cur, 1, 0, 0) - at(cur, -1, 0, 0)),
            0.5 * (at(cur, 0, 1, 0) - at(cur, 0, -1, 0)),
            0.5 * (at(cur, 0, 0, 1) - at(cur, 0, 0, -1)),
            0.5 * (next.get(xu, yu, zu) - prev.get(xu, yu, zu)),
        );

        let dxx = at(cur, 1, 0, 0) + at(cur, -1, 0, 0) - 2.0 * v;
        let dyy = at(cur, 0, 1, 0) + at(cur, 0, -1, 0) - 2.0 * v;
        let dzz = at(cur, 0, 0, 1) + at(cur, 0, 0, -1) - 2.0 * v;
        let dss = next.get(xu, yu, zu) + prev.get(xu, yu, zu) - 2.0 * v;
        let cross = |a: (isize, isize, isize), b: (isize, isize, isize)| {
            0.25 * (at(cur, a.0 + b.0, a.1 + b.1, a.2 + b.2)
                - at(cur, b.0 - a.0, b.1 - a.1, b.2 - a.2)
                - at(cur, a.0 - b.0, a.1 - b.1, a.2 - b.2)
                + at(cur, -a.0 - b.0, -a.1 - b.1, -a.2 - b.2))
        };
        let dxy = cross((1, 0, 0), (0, 1, 0));
        let dxz = cross((1, 0, 0), (0, 0, 1));
        let dyz = cross((0, 1, 0), (0, 0, 1));
        let scale_cross = |dx: isize, dy: isize, dz: isize| {
            0.25 * (at(next, dx, dy, dz) - at(next, -dx, -dy, -dz) - at(prev, dx, dy, dz)
                + at(prev, -dx, -dy, -dz))
        };
        let dxs = scale_cross(1, 0, 0);
        let dys = scale_cross(0, 1, 0);
        let dzs = scale_cross(0, 0, 1);

        #[rustfmt::skip]
        let hess = Matrix4::new(
            dxx, dxy, dxz, dxs,
            dxy, dyy, dyz, dys,
            dxz, dyz, dzz, dzs,
            dxs, dys, dzs, dss,
        );
        let shift = hess
            .lu()
            .solve(&(-g))
            .filter(|s| s.iter().all(|c| c.is_finite()))
            .ok_or(Rejection::Singular)?;

        if shift.iter().all(|c| c.abs() < 0.5) {
            let response = v + 0.5 * g.dot(&shift);
            if response.abs() * (levels as f32) < params.contrast_threshold {
                return Err(Rejection::LowContrast);
            }
            let spatial = Matrix3::new(dxx, dxy, dxz, dxy, dyy, dyz, dxz, dyz, dzz);
            if !is_blob_like(spatial, params.edge_ratio) {
                return Err(Rejection::Edge);
            }
            let spacing = octave_scale(cand.octave);
            let scale = s as f32 + shift.w;
            return Ok(VolumeKeypoint {
                x: (x as f32 + shift.x) * spacing,
                y: (y as f32 + shift.y) * spacing,
                z: (z as f32 + shift.z) * spacing,
                octave: cand.octave,
                layer: su,
                scale,
                size: keypoint_size(params.scale_space.sigma, levels, cand.octave, scale),
                response,
            });
        }

        x += shift.x.round() as isize;
        y += shift.y.round() as isize;
        z += shift.z.round() as isize;
        s += shift.w.round() as isize;
        if x < 1
            || x >= w - 1
            || y < 1
            || y >= h - 1
            || z < 1
            || z >= d - 1
            || s < 1
            || s > last_layer
        {
            return Err(Rejection::OutOfBounds);
        }
    }
    Err(Rejection::Unconverged)
}

fn is_blob_like(spatial: Matrix3<f32>, edge_ratio: f32) -> bool {
    let eig = spatial.symmetric_eigen().eigenvalues;
    let all_pos = eig.iter().all(|&l| l > 0.0);
    let all_neg = eig.iter().all(|&l| l < 0.0);
    if !(all_pos || all_neg) {
        return false;
    }
    let max = eig.iter().fold(0.0f32, |m, l| m.max(l.abs()));
    let min = eig.iter().fold(f32::INFINITY, |m, l| m.min(l.abs()));
    max <= edge_ratio * min
}
