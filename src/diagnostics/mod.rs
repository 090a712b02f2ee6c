//! Serializable traces of estimation and stitching runs.
//!
//! [`EstimateReport`] is returned by every
//! [`OffsetEstimator`](crate::estimator::OffsetEstimator) and carries the
//! resolved offset next to per-plane keypoint bookkeeping, the SSD score curve
//! and stage timings. [`SeriesReport`] collects one entry per seam of a
//! sequential stitch.

pub mod report;
pub mod timing;

pub use report::{
    AxisCounts, EstimateReport, PlanePass, PlaneReport, SeamReport, SeriesReport, SsdSample,
    VolumeMatchReport,
};
pub use timing::{StageTiming, TimingBreakdown};
