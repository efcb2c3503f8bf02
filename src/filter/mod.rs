//! Confidence and geometry filtering of decoded candidates.
//!
//! Almost every anchor of a frame is rejected here; rejection is the normal
//! outcome and is only counted, never reported as an error. The two rules are
//! independent and a candidate must pass both.

use crate::decode::{Candidate, ClassScore};
use crate::geometry::BoundingBox;
use crate::trace::{trace_event, trace_span};
use crate::util::{SightlineError, SightlineResult};

mod thresholds;

pub use thresholds::{ClassThresholds, Thresholds, DEFAULT_CONFIDENCE_THRESHOLD};

/// Default minimum box side in source-image pixels.
pub const DEFAULT_MIN_BOX_PX: f32 = 30.0;
/// Default maximum elongation `max(w / h, h / w)`.
pub const DEFAULT_MAX_ASPECT_RATIO: f32 = 8.0;

/// Geometric acceptance rules, evaluated in source-image pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryLimits {
    /// Minimum width and minimum height in pixels.
    pub min_box_px: f32,
    /// Maximum aspect ratio in either orientation.
    pub max_aspect_ratio: f32,
}

impl Default for GeometryLimits {
    fn default() -> Self {
        Self {
            min_box_px: DEFAULT_MIN_BOX_PX,
            max_aspect_ratio: DEFAULT_MAX_ASPECT_RATIO,
        }
    }
}

impl GeometryLimits {
    /// Validates the limits.
    pub fn validate(&self) -> SightlineResult<()> {
        if !self.min_box_px.is_finite() || self.min_box_px < 0.0 {
            return Err(SightlineError::InvalidConfig(
                "min_box_px must be finite and non-negative",
            ));
        }
        if !self.max_aspect_ratio.is_finite() || self.max_aspect_ratio < 1.0 {
            return Err(SightlineError::InvalidConfig(
                "max_aspect_ratio must be finite and at least 1",
            ));
        }
        Ok(())
    }

    /// True when a normalized box is large and compact enough.
    ///
    /// `bbox` must already be clipped to the unit square.
    pub fn accepts(&self, bbox: &BoundingBox, image_width: f32, image_height: f32) -> bool {
        if !bbox.is_valid() {
            return false;
        }
        let px = bbox.to_pixels(image_width, image_height);
        let w = px.width();
        let h = px.height();
        if w < self.min_box_px || h < self.min_box_px {
            return false;
        }
        px.aspect_ratio() <= self.max_aspect_ratio
    }
}

/// A candidate that passed both filter rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Accepted {
    /// Anchor index in the source tensor; NMS tie-breaker.
    pub anchor: usize,
    /// Box normalized to the source image and clipped to `[0, 1]`.
    pub bbox: BoundingBox,
    /// Best class id.
    pub class_id: usize,
    /// Confidence of the best class.
    pub confidence: f32,
    /// Second-best class, if the head has more than one.
    pub runner_up: Option<ClassScore>,
}

/// Applies the confidence rule to one candidate.
#[inline]
pub fn passes_confidence(candidate: &Candidate, thresholds: &ClassThresholds) -> bool {
    candidate.confidence >= thresholds.get(candidate.class_id)
}

/// Filters candidates by confidence and geometry.
///
/// `image_size` is the source frame `(width, height)` in pixels; candidate
/// boxes are fractions of it. Output keeps input order.
pub fn filter_candidates<I>(
    candidates: I,
    thresholds: &ClassThresholds,
    limits: &GeometryLimits,
    image_size: (usize, usize),
) -> Vec<Accepted>
where
    I: IntoIterator<Item = Candidate>,
{
    let _span = trace_span!("filter").entered();
    let (image_width, image_height) = (image_size.0 as f32, image_size.1 as f32);

    let mut low_confidence = 0usize;
    let mut bad_geometry = 0usize;
    let mut accepted = Vec::new();
    for candidate in candidates {
        if !passes_confidence(&candidate, thresholds) {
            low_confidence += 1;
            continue;
        }
        // Clipping would turn an infinite extent into a full-frame box.
        let raw = candidate.center.to_bbox();
        if !candidate.center.is_finite() || !raw.is_valid() {
            bad_geometry += 1;
            continue;
        }
        let bbox = raw.clamp_unit();
        if !limits.accepts(&bbox, image_width, image_height) {
            bad_geometry += 1;
            continue;
        }
        accepted.push(Accepted {
            anchor: candidate.anchor,
            bbox,
            class_id: candidate.class_id,
            confidence: candidate.confidence,
            runner_up: candidate.runner_up,
        });
    }

    trace_event!(
        "filtered",
        accepted = accepted.len(),
        low_confidence = low_confidence,
        bad_geometry = bad_geometry
    );
    accepted
}
