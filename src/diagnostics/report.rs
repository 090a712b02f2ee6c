use super::TimingBreakdown;
use crate::features::ExtractionStats;
use crate::types::{Offset3, StitchOffset};
use crate::volume::Plane;
use serde::Serialize;

/// Per-axis displacement vote counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AxisCounts {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl From<[usize; 3]> for AxisCounts {
    fn from([x, y, z]: [usize; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Which slicing pass produced a plane entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanePass {
    /// Vertical cuts through the overlap slabs, voting for Z and one lateral axis.
    Overlap,
    /// Transverse cuts at the resolved overlap, voting for X and Y.
    Transverse,
}

/// Keypoint and match bookkeeping for one pair of slices.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneReport {
    pub pass: PlanePass,
    pub plane: Plane,
    pub first_index: usize,
    pub second_index: usize,
    pub first: ExtractionStats,
    pub second: ExtractionStats,
    pub matches: usize,
}

/// Keypoint and match bookkeeping for a volumetric estimate.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMatchReport {
    pub first: ExtractionStats,
    pub second: ExtractionStats,
    pub matches: usize,
    pub first_octaves: usize,
    pub second_octaves: usize,
}

/// Mean squared difference at one candidate overlap depth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SsdSample {
    pub overlap: usize,
    pub score: f64,
}

/// Everything an estimator learned about one pair of volumes.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateReport {
    pub estimator: String,
    pub offset: StitchOffset,
    /// Depth of the slabs examined, `M`.
    pub overlap_window: usize,
    pub samples: AxisCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planes: Vec<PlaneReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumetric: Option<VolumeMatchReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssd_curve: Vec<SsdSample>,
    /// Ground truth carried by the second volume's metadata, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Offset3>,
    pub timings: TimingBreakdown,
}

impl EstimateReport {
    pub fn new(estimator: impl Into<String>, offset: StitchOffset) -> Self {
        Self {
            estimator: estimator.into(),
            offset,
            overlap_window: 0,
            samples: AxisCounts::default(),
            planes: Vec::new(),
            volumetric: None,
            ssd_curve: Vec::new(),
            reference: None,
            timings: TimingBreakdown::default(),
        }
    }

    /// Total matches over every plane and the volumetric pass.
    pub fn total_matches(&self) -> usize {
        self.planes.iter().map(|p| p.matches).sum::<usize>()
            + self.volumetric.as_ref().map_or(0, |v| v.matches)
    }
}

/// One seam of a sequential stitch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeamReport {
    /// Index of the volume appended at this seam.
    pub index: usize,
    /// Offset actually applied after clamping.
    pub applied: StitchOffset,
    pub placement: Offset3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<EstimateReport>,
    pub elapsed_ms: f64,
}

/// Trace of a sequential stitch.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesReport {
    /// Placement of every input relative to the first volume.
    pub placements: Vec<Offset3>,
    pub seams: Vec<SeamReport>,
    pub total_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sections_are_omitted_from_json() {
        let report = EstimateReport::new("ssd", StitchOffset::overlap(12));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["estimator"], "ssd");
        assert_eq!(json["offset"]["dz"], 12);
        assert!(json.get("planes").is_none());
        assert!(json.get("ssdCurve").is_none());
        assert!(json.get("reference").is_none());
        assert_eq!(report.total_matches(), 0);
    }

    #[test]
    fn plane_entries_name_their_pass() {
        let mut report = EstimateReport::new("planar", StitchOffset::new(1, 2, 3));
        report.planes.push(PlaneReport {
            pass: PlanePass::Transverse,
            plane: Plane::Transverse,
            first_index: 30,
            second_index: 4,
            first: ExtractionStats::default(),
            second: ExtractionStats::default(),
            matches: 7,
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["planes"][0]["pass"], "transverse");
        assert_eq!(json["planes"][0]["plane"], "transverse");
        assert_eq!(json["planes"][0]["firstIndex"], 30);
        assert_eq!(report.total_matches(), 7);
    }
}
