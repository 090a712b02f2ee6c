//! Robust per-axis offset resolution.
use crate::types::StitchOffset;

/// Statistical median of `values`, reordering them in place.
///
/// Odd counts give the middle element, even counts the mean of the two middle
/// elements. NaNs sort last.
pub fn median(values: &mut [f32]) -> Option<f32> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    if n % 2 == 1 {
        Some(values[n / 2])
    } else {
        Some(0.5 * (values[n / 2 - 1] + values[n / 2]))
    }
}

/// Displacement votes collected per axis over every plane and pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AxisSamples {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
}

impl AxisSamples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.z.clear();
    }

    /// Sample counts `[x, y, z]`.
    pub fn counts(&self) -> [usize; 3] {
        [self.x.len(), self.y.len(), self.z.len()]
    }

    /// Rounded median of one axis, or `default` when it has no votes.
    pub fn resolve_axis(values: &[f32], default: i32) -> i32 {
        let mut scratch = values.to_vec();
        median(&mut scratch)
            .filter(|m| m.is_finite())
            .map(|m| m.round() as i32)
            .unwrap_or(default)
    }

    /// Per-axis medians. Empty lateral axes give 0, an empty Z axis gives 1.
    pub fn resolve(&self) -> StitchOffset {
        StitchOffset::new(
            Self::resolve_axis(&self.x, 0),
            Self::resolve_axis(&self.y, 0),
            Self::resolve_axis(&self.z, 1),
        )
    }
}
