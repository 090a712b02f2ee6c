use crate::error::{Result, StitchError};
use serde::{Deserialize, Serialize};

/// Octaves whose smallest extent would drop below this are not built.
pub const MIN_OCTAVE_EXTENT: usize = 8;

/// Options controlling scale-space construction.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleSpaceOptions {
    /// Requested number of octaves (>= 1). Capped by the input extent.
    pub octaves: usize,
    /// Scale levels per octave `S` (>= 1). Each octave holds `S + 3`
    /// Gaussian layers and `S + 2` DoG layers.
    pub levels: usize,
    /// Base blur `σ0`.
    pub sigma: f32,
    /// Kernel radius in units of σ, `radius = ceil(factor·σ)`.
    pub kernel_radius_factor: f32,
}

impl ScaleSpaceOptions {
    /// Defaults for 2D slices.
    pub fn planar() -> Self {
        Self {
            octaves: 4,
            levels: 3,
            sigma: 1.6,
            kernel_radius_factor: 3.0,
        }
    }

    /// Defaults for 3D volumes; a shorter kernel keeps 3D passes affordable.
    pub fn volumetric() -> Self {
        Self {
            octaves: 2,
            levels: 2,
            sigma: 0.9,
            kernel_radius_factor: 2.0,
        }
    }

    pub fn with_octaves(mut self, octaves: usize) -> Self {
        self.octaves = octaves;
        self
    }

    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn with_kernel_radius_factor(mut self, factor: f32) -> Self {
        self.kernel_radius_factor = factor;
        self
    }

    /// Reject layouts the builder cannot honour. Configs deserialize without
    /// bounds, so estimators call this before building.
    pub fn validate(&self) -> Result<()> {
        if self.octaves == 0 {
            return Err(StitchError::metadata("scale space needs at least one octave"));
        }
        if self.levels == 0 {
            return Err(StitchError::metadata("scale space needs at least one level"));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(StitchError::metadata(format!(
                "scale space sigma must be positive, got {}",
                self.sigma
            )));
        }
        if !(self.kernel_radius_factor.is_finite() && self.kernel_radius_factor > 0.0) {
            return Err(StitchError::metadata(format!(
                "kernel radius factor must be positive, got {}",
                self.kernel_radius_factor
            )));
        }
        Ok(())
    }

    /// Scale step between consecutive layers, `k = 2^(1/S)`.
    pub fn k(&self) -> f32 {
        2f32.powf(1.0 / self.levels as f32)
    }

    pub fn gaussian_layers(&self) -> usize {
        self.levels + 3
    }

    pub fn dog_layers(&self) -> usize {
        self.levels + 2
    }

    /// Kernel σ applied to layer `level - 1` to produce `level`:
    /// `σ0·2^octave·k^level`.
    pub fn layer_sigma(&self, octave: usize, level: usize) -> f32 {
        self.sigma * 2f32.powi(octave as i32) * self.k().powi(level as i32)
    }

    /// Octaves that fit an input whose smallest extent is `min_extent`.
    pub fn effective_octaves(&self, min_extent: usize) -> usize {
        let mut extent = min_extent;
        let mut count = 1;
        while count < self.octaves {
            extent = extent.div_ceil(2);
            if extent < MIN_OCTAVE_EXTENT {
                break;
            }
            count += 1;
        }
        count
    }
}

impl Default for ScaleSpaceOptions {
    fn default() -> Self {
        Self::planar()
    }
}

impl std::fmt::Debug for ScaleSpaceOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScaleSpaceOptions")
            .field("octaves", &self.octaves)
            .field("levels", &self.levels)
            .field("sigma", &self.sigma)
            .field("k", &self.k())
            .field("kernel_radius_factor", &self.kernel_radius_factor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_sigma_grows_by_k_and_octave() {
        let opts = ScaleSpaceOptions::planar();
        let k = opts.k();
        assert!((opts.layer_sigma(0, 0) - 1.6).abs() < 1e-6);
        assert!((opts.layer_sigma(0, 2) - 1.6 * k * k).abs() < 1e-5);
        assert!((opts.layer_sigma(2, 3) - 1.6 * 4.0 * 2.0).abs() < 1e-4);
    }

    #[test]
    fn octaves_capped_by_extent() {
        let opts = ScaleSpaceOptions::planar();
        assert_eq!(opts.effective_octaves(40), 3);
        assert_eq!(opts.effective_octaves(512), 4);
        assert_eq!(opts.effective_octaves(9), 1);
        assert_eq!(opts.with_octaves(1).effective_octaves(1000), 1);
    }

    #[test]
    fn validate_rejects_empty_layouts() {
        assert!(ScaleSpaceOptions::planar().validate().is_ok());
        assert!(ScaleSpaceOptions::volumetric().validate().is_ok());
        let err = ScaleSpaceOptions::planar().with_levels(0).validate().unwrap_err();
        assert!(matches!(err, StitchError::Metadata(_)), "unexpected error: {err}");
        assert!(ScaleSpaceOptions::planar().with_octaves(0).validate().is_err());
        assert!(ScaleSpaceOptions::planar().with_sigma(0.0).validate().is_err());
        assert!(ScaleSpaceOptions::planar()
            .with_kernel_radius_factor(f32::NAN)
            .validate()
            .is_err());
    }
}
