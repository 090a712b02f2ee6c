//! Deterministic blob fields cut into overlapping scan parts.
use volume_stitcher::{Range, Size3, VoxelVolume};

/// Lateral extent and total depth of the synthetic specimen.
pub const WORLD: Size3 = Size3::new(64, 64, 50);

/// Marsaglia xorshift32; deterministic across platforms.
pub struct XorShift(u32);

impl XorShift {
    pub fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }
}

/// Parameters of a field of axis-aligned anisotropic Gaussian blobs over a
/// slowly rising background.
#[derive(Clone, Copy, Debug)]
pub struct BlobField {
    pub seed: u32,
    pub count: usize,
    pub lateral_sigma: (f32, f32),
    pub axial_sigma: (f32, f32),
    pub amplitude: (f32, f32),
    pub lateral_centre: (f32, f32),
    pub axial_centre: (f32, f32),
}

impl BlobField {
    /// Few wide blobs; suits slice-based keypoints.
    pub fn coarse() -> Self {
        Self {
            seed: 0x9E37_79B9,
            count: 30,
            lateral_sigma: (4.0, 6.0),
            axial_sigma: (3.0, 5.0),
            amplitude: (60.0, 160.0),
            lateral_centre: (8.0, 56.0),
            axial_centre: (18.0, 32.0),
        }
    }

    /// Many small blobs; suits volumetric keypoints.
    pub fn fine() -> Self {
        Self {
            seed: 0x9E37_79B9,
            count: 150,
            lateral_sigma: (1.5, 3.0),
            axial_sigma: (1.5, 3.0),
            amplitude: (60.0, 160.0),
            lateral_centre: (6.0, 58.0),
            axial_centre: (16.0, 34.0),
        }
    }

    pub fn background(z: usize) -> f32 {
        16.0 + 0.02 * z as f32
    }

    /// Render the whole specimen, `WORLD` sized, layer-major.
    pub fn render(&self) -> Vec<f32> {
        let (w, h, d) = (WORLD.x, WORLD.y, WORLD.z);
        let mut data: Vec<f32> = (0..d)
            .flat_map(|z| std::iter::repeat(Self::background(z)).take(w * h))
            .collect();
        let mut rng = XorShift::new(self.seed);
        for _ in 0..self.count {
            let cx = rng.range(self.lateral_centre.0, self.lateral_centre.1);
            let cy = rng.range(self.lateral_centre.0, self.lateral_centre.1);
            let cz = rng.range(self.axial_centre.0, self.axial_centre.1);
            let sx = rng.range(self.lateral_sigma.0, self.lateral_sigma.1);
            let sy = rng.range(self.lateral_sigma.0, self.lateral_sigma.1);
            let sz = rng.range(self.axial_sigma.0, self.axial_sigma.1);
            let amp = rng.range(self.amplitude.0, self.amplitude.1);

            let span = |c: f32, s: f32, n: usize| {
                let r = (3.5 * s).ceil() as i64;
                let lo = (c as i64 - r).max(0) as usize;
                let hi = (c as i64 + r + 1).min(n as i64).max(0) as usize;
                lo..hi
            };
            for z in span(cz, sz, d) {
                let ez = (z as f32 - cz).powi(2) / (2.0 * sz * sz);
                for y in span(cy, sy, h) {
                    let ey = (y as f32 - cy).powi(2) / (2.0 * sy * sy);
                    let row = z * w * h + y * w;
                    for x in span(cx, sx, w) {
                        let ex = (x as f32 - cx).powi(2) / (2.0 * sx * sx);
                        data[row + x] += amp * (-(ex + ey + ez)).exp();
                    }
                }
            }
        }
        data
    }
}

/// Rendered specimen that scan parts are cut from.
pub struct Specimen {
    data: Vec<f32>,
}

impl Specimen {
    pub fn new(field: BlobField) -> Self {
        Self {
            data: field.render(),
        }
    }

    pub fn at(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[z * WORLD.layer_len() + y * WORLD.x + x]
    }

    /// Layers `z0..z1` of the specimen.
    pub fn part(&self, z0: usize, z1: usize) -> VoxelVolume {
        self.shifted_part(z0, z1, 0, 0)
    }

    /// Layers `z0..z1`, with content moved so that specimen `(x, y)` lands
    /// at `(x + dx, y + dy)`. Uncovered voxels show the background.
    pub fn shifted_part(&self, z0: usize, z1: usize, dx: i64, dy: i64) -> VoxelVolume {
        let size = Size3::new(WORLD.x, WORLD.y, z1 - z0);
        VoxelVolume::from_fn(size, |x, y, z| {
            let (sx, sy) = (x as i64 - dx, y as i64 - dy);
            let wz = z + z0;
            if (0..WORLD.x as i64).contains(&sx) && (0..WORLD.y as i64).contains(&sy) {
                self.at(sx as usize, sy as usize, wz)
            } else {
                BlobField::background(wz)
            }
        })
    }

    pub fn range(&self) -> Range {
        Range::of_samples(&self.data).unwrap_or(Range::UNIT)
    }
}
