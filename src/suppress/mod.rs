//! Duplicate suppression and ranking.
//!
//! The default is class-agnostic: a box is compared against every kept box
//! regardless of class, so a "dog" and a "cat" predicted on the same spot
//! collapse into the more confident one. [`SuppressionMode::PerClass`] runs
//! NMS within each class instead and lets co-located objects of different
//! classes survive together.

use crate::filter::Accepted;
use crate::trace::{trace_event, trace_span};
use crate::util::{SightlineError, SightlineResult};
use std::collections::BTreeMap;

mod nms;

pub use nms::nms;

/// Default IoU at or above which the weaker box is dropped.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// Scope of overlap comparisons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SuppressionMode {
    /// Compare against all kept boxes.
    #[default]
    ClassAgnostic,
    /// Compare only against kept boxes of the same class.
    PerClass,
}

/// Checks an IoU threshold.
pub fn validate_iou_threshold(iou_threshold: f32) -> SightlineResult<()> {
    if !iou_threshold.is_finite() || !(0.0..=1.0).contains(&iou_threshold) {
        return Err(SightlineError::InvalidThreshold {
            name: "iou".to_string(),
            value: iou_threshold,
        });
    }
    Ok(())
}

/// Runs NMS in the given mode; output is sorted by descending confidence.
pub fn suppress(boxes: Vec<Accepted>, iou_threshold: f32, mode: SuppressionMode) -> Vec<Accepted> {
    let _span = trace_span!("suppress", input = boxes.len()).entered();

    let kept = match mode {
        SuppressionMode::ClassAgnostic => nms(boxes, iou_threshold),
        SuppressionMode::PerClass => {
            let mut by_class: BTreeMap<usize, Vec<Accepted>> = BTreeMap::new();
            for b in boxes {
                by_class.entry(b.class_id).or_default().push(b);
            }
            let mut merged: Vec<Accepted> = by_class
                .into_values()
                .flat_map(|group| nms(group, iou_threshold))
                .collect();
            nms::sort_by_confidence_desc(&mut merged);
            merged
        }
    };

    trace_event!("suppressed", kept = kept.len());
    kept
}

/// Keeps the `k` most confident entries of an already sorted list.
pub fn truncate_top_k(kept: &mut Vec<Accepted>, k: usize) {
    kept.truncate(k);
}
