//! JSON configuration of the `stitch_series` tool.
//!
//! ```json
//! {
//!   "series": "scans/info.json",
//!   "estimator": { "kind": "planar", "matcher": { "ratio_threshold": 0.8 } },
//!   "output": { "dir": "out/stitched", "report_json": "out/report.json" }
//! }
//! ```
use crate::estimator::EstimatorConfig;
use crate::stitcher::{PairwiseStitcher, SequentialStitcher};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct StitchToolConfig {
    /// Root `info.json` listing `parts_num` sub-volumes.
    #[serde(default)]
    pub series: Option<PathBuf>,
    /// Explicit per-part `info.json` files, used when `series` is absent.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    /// Separate the parts by this many background layers instead of
    /// estimating an overlap.
    #[serde(default)]
    pub gap_layers: Option<usize>,
    pub output: StitchOutputConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StitchOutputConfig {
    /// Directory receiving the stitched layers and their `info.json`.
    pub dir: PathBuf,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
    /// Mid-volume sagittal cut of the result.
    #[serde(default)]
    pub preview_png: Option<PathBuf>,
}

impl StitchToolConfig {
    /// Stitcher matching the configured seam policy.
    pub fn stitcher(&self) -> SequentialStitcher {
        let pairwise = match self.gap_layers {
            Some(layers) => PairwiseStitcher::with_gap(layers),
            None => PairwiseStitcher::new(self.estimator.build()),
        };
        SequentialStitcher::new(pairwise)
    }
}

pub fn load_config(path: &Path) -> Result<StitchToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: StitchToolConfig = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    if config.series.is_none() && config.inputs.is_empty() {
        return Err(format!(
            "Config {} names neither `series` nor `inputs`",
            path.display()
        ));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stitcher::SeamPolicy;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("volume_stitcher_cfg_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_documented_example() {
        let path = write_temp(
            "example.json",
            r#"{
                "series": "scans/info.json",
                "estimator": { "kind": "planar", "matcher": { "ratio_threshold": 0.8 } },
                "output": { "dir": "out/stitched", "report_json": "out/report.json" }
            }"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.series, Some(PathBuf::from("scans/info.json")));
        match &cfg.estimator {
            EstimatorConfig::Planar(p) => assert_eq!(p.matcher.ratio_threshold, Some(0.8)),
            other => panic!("unexpected estimator {other:?}"),
        }
        assert!(cfg.output.preview_png.is_none());
        assert!(matches!(cfg.stitcher().pairwise().policy(), SeamPolicy::Estimate(_)));
    }

    #[test]
    fn gap_layers_select_separation_policy() {
        let path = write_temp(
            "gap.json",
            r#"{ "inputs": ["a/info.json", "b/info.json"], "gap_layers": 3, "output": { "dir": "out" } }"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.inputs.len(), 2);
        assert!(matches!(cfg.stitcher().pairwise().policy(), SeamPolicy::Gap(3)));
    }

    #[test]
    fn missing_inputs_are_rejected() {
        let path = write_temp("empty.json", r#"{ "output": { "dir": "out" } }"#);
        let err = load_config(&path).unwrap_err();
        assert!(err.contains("neither"), "{err}");
    }
}
