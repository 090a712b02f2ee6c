use serde::{Deserialize, Serialize};
use std::fmt;

/// Volume dimensions in voxels along X, Y and Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size3 {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Size3 {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Total voxel count `x·y·z`.
    pub fn volume(&self) -> usize {
        self.x * self.y * self.z
    }

    /// Samples in one Z layer.
    pub fn layer_len(&self) -> usize {
        self.x * self.y
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// True when both sizes agree along X and Y.
    pub fn same_lateral(&self, other: &Size3) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl fmt::Display for Size3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Closed intensity interval `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const UNIT: Range = Range { min: 0.0, max: 1.0 };
    pub const U8: Range = Range {
        min: 0.0,
        max: 255.0,
    };

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Smallest range covering both inputs.
    pub fn union(&self, other: &Range) -> Range {
        Range {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Linearly remap `v` from this range into `target`.
    ///
    /// A zero-width source range maps every value to `target.min`.
    #[inline]
    pub fn fit(&self, v: f32, target: Range) -> f32 {
        let span = self.span();
        if span <= 0.0 {
            return target.min;
        }
        (v - self.min) / span * target.span() + target.min
    }

    /// Min/max of a sample slice, or `None` when empty.
    pub fn of_samples(samples: &[f32]) -> Option<Range> {
        let mut iter = samples.iter().copied().filter(|v| v.is_finite());
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Range { min, max })
    }
}

impl Default for Range {
    fn default() -> Self {
        Range::U8
    }
}

/// Integer placement of one volume relative to another volume's origin.
///
/// Used both for reference offsets carried by scan metadata and for the
/// placement recorded after stitching, `(dx, dy, first.Z − overlap)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Offset3 {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Result of offset estimation between two consecutive scans.
///
/// `dz` is the overlap depth: the count of layers shared by the tail of the
/// first volume and the head of the second. `dx`/`dy` locate the second
/// volume's content laterally, so a structure at `first(x, y)` is found at
/// `second(x + dx, y + dy)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StitchOffset {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
}

impl StitchOffset {
    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Self { dx, dy, dz }
    }

    /// Overlap-only offset with no lateral shift.
    pub const fn overlap(dz: i32) -> Self {
        Self { dx: 0, dy: 0, dz }
    }

    /// Placement of the second volume inside the first volume's frame.
    pub fn placement(&self, first_depth: usize) -> Offset3 {
        Offset3::new(self.dx, self.dy, first_depth as i32 - self.dz)
    }
}

impl fmt::Display for StitchOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(dx={}, dy={}, dz={})", self.dx, self.dy, self.dz)
    }
}
