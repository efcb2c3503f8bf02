//! Pipeline configuration.

use crate::decode::{CoordinateMode, ScoreActivation};
use crate::filter::GeometryLimits;
use crate::suppress::{validate_iou_threshold, SuppressionMode, DEFAULT_IOU_THRESHOLD};
use crate::util::SightlineResult;

/// Default number of detections returned per frame.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Frame-independent settings of the post-processing pipeline.
///
/// Confidence thresholds are not part of this struct; they travel with each
/// detect call as a [`crate::Thresholds`] value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    /// IoU at or above which the weaker of two boxes is suppressed.
    pub iou_threshold: f32,
    /// Minimum size and maximum elongation of accepted boxes.
    pub geometry: GeometryLimits,
    /// Coordinate convention of the detector head.
    pub coordinate_mode: CoordinateMode,
    /// Mapping from raw class scores to confidences.
    pub activation: ScoreActivation,
    /// Cross-class or per-class suppression.
    pub suppression: SuppressionMode,
    /// Decode anchors in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            geometry: GeometryLimits::default(),
            coordinate_mode: CoordinateMode::Auto,
            activation: ScoreActivation::Identity,
            suppression: SuppressionMode::ClassAgnostic,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Validates every field.
    pub fn validate(&self) -> SightlineResult<()> {
        validate_iou_threshold(self.iou_threshold)?;
        self.geometry.validate()
    }
}
