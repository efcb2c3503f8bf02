//! Greedy non-maximum suppression over accepted boxes.

use crate::filter::Accepted;
use crate::geometry::iou;
use std::cmp::Ordering;

fn accepted_cmp_desc(a: &Accepted, b: &Accepted) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.anchor.cmp(&b.anchor))
}

/// Sorts by descending confidence, ties broken by ascending anchor index.
pub(crate) fn sort_by_confidence_desc(items: &mut [Accepted]) {
    items.sort_by(accepted_cmp_desc);
}

/// Class-agnostic greedy NMS.
///
/// Boxes are visited in descending confidence and kept when their IoU with
/// every previously kept box is below `iou_threshold`. The result is sorted by
/// descending confidence.
pub fn nms(mut boxes: Vec<Accepted>, iou_threshold: f32) -> Vec<Accepted> {
    sort_by_confidence_desc(&mut boxes);
    let mut kept: Vec<Accepted> = Vec::with_capacity(boxes.len().min(64));

    'outer: for candidate in boxes {
        for kept_box in kept.iter() {
            if iou(&candidate.bbox, &kept_box.bbox) >= iou_threshold {
                continue 'outer;
            }
        }
        kept.push(candidate);
    }

    kept
}
