use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sightline::lowlevel::{nms, suppress, truncate_top_k, Accepted, DEFAULT_IOU_THRESHOLD};
use sightline::{iou, BoundingBox, SuppressionMode};

fn accepted(anchor: usize, class_id: usize, bbox: BoundingBox, confidence: f32) -> Accepted {
    Accepted {
        anchor,
        bbox,
        class_id,
        confidence,
        runner_up: None,
    }
}

fn random_boxes(rng: &mut StdRng, count: usize) -> Vec<Accepted> {
    (0..count)
        .map(|anchor| {
            let left = rng.random_range(0.0..0.7);
            let top = rng.random_range(0.0..0.7);
            let w = rng.random_range(0.05..0.3);
            let h = rng.random_range(0.05..0.3);
            accepted(
                anchor,
                rng.random_range(0..3),
                BoundingBox::new(left, top, left + w, top + h),
                rng.random_range(0.25..1.0),
            )
        })
        .collect()
}

#[test]
fn heavy_overlap_keeps_the_stronger_box() {
    // IoU 0.9: same rows, widths 0.5 and 0.45 sharing the left edge.
    let a = accepted(0, 0, BoundingBox::new(0.0, 0.0, 0.5, 0.5), 0.9);
    let b = accepted(1, 0, BoundingBox::new(0.0, 0.0, 0.45, 0.5), 0.8);
    assert!((iou(&a.bbox, &b.bbox) - 0.9).abs() < 1e-5);

    let kept = nms(vec![b, a], DEFAULT_IOU_THRESHOLD);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].anchor, 0);
}

#[test]
fn light_overlap_keeps_both_sorted() {
    let a = accepted(0, 0, BoundingBox::new(0.0, 0.0, 0.5, 0.5), 0.6);
    let b = accepted(1, 0, BoundingBox::new(0.4, 0.0, 0.9, 0.5), 0.8);
    assert!(iou(&a.bbox, &b.bbox) < 0.2);

    let kept = nms(vec![a, b], DEFAULT_IOU_THRESHOLD);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].anchor, 1);
    assert_eq!(kept[1].anchor, 0);
}

#[test]
fn overlap_at_threshold_is_suppressed() {
    let a = accepted(0, 0, BoundingBox::new(0.0, 0.0, 0.5, 0.5), 0.9);
    let b = accepted(1, 0, BoundingBox::new(0.0, 0.25, 0.5, 0.75), 0.8);
    let iou_ab = iou(&a.bbox, &b.bbox);
    let kept = nms(vec![a, b], iou_ab);
    assert_eq!(kept.len(), 1);
}

#[test]
fn class_agnostic_and_per_class_modes_differ() {
    let bbox = BoundingBox::new(0.1, 0.1, 0.5, 0.5);
    let dog = accepted(0, 16, bbox, 0.7);
    let cat = accepted(1, 15, bbox, 0.6);

    let agnostic = suppress(vec![dog, cat], 0.45, SuppressionMode::ClassAgnostic);
    assert_eq!(agnostic.len(), 1);
    assert_eq!(agnostic[0].class_id, 16);

    let per_class = suppress(vec![dog, cat], 0.45, SuppressionMode::PerClass);
    assert_eq!(per_class.len(), 2);
    assert!(per_class[0].confidence >= per_class[1].confidence);
}

#[test]
fn survivors_never_overlap_and_rerun_is_stable() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let boxes = random_boxes(&mut rng, 60);
        let kept = nms(boxes, DEFAULT_IOU_THRESHOLD);

        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                assert!(iou(&a.bbox, &b.bbox) < DEFAULT_IOU_THRESHOLD);
                assert!(a.confidence >= b.confidence);
            }
        }

        let again = nms(kept.clone(), DEFAULT_IOU_THRESHOLD);
        assert_eq!(again, kept);
    }
}

#[test]
fn per_class_survivors_never_overlap_within_a_class() {
    let mut rng = StdRng::seed_from_u64(3);
    let kept = suppress(
        random_boxes(&mut rng, 80),
        DEFAULT_IOU_THRESHOLD,
        SuppressionMode::PerClass,
    );
    for (i, a) in kept.iter().enumerate() {
        for b in kept.iter().skip(i + 1) {
            if a.class_id == b.class_id {
                assert!(iou(&a.bbox, &b.bbox) < DEFAULT_IOU_THRESHOLD);
            }
        }
    }
}

#[test]
fn truncation_keeps_the_most_confident() {
    // Twenty disjoint boxes on a 5x4 grid.
    let mut boxes: Vec<Accepted> = (0..20)
        .map(|i| {
            let x = (i % 5) as f32 * 0.2;
            let y = (i / 5) as f32 * 0.25;
            accepted(
                i,
                0,
                BoundingBox::new(x, y, x + 0.1, y + 0.1),
                0.3 + i as f32 * 0.03,
            )
        })
        .collect();
    boxes.reverse();

    let mut kept = nms(boxes, DEFAULT_IOU_THRESHOLD);
    assert_eq!(kept.len(), 20);
    truncate_top_k(&mut kept, 5);
    let anchors: Vec<usize> = kept.iter().map(|a| a.anchor).collect();
    assert_eq!(anchors, vec![19, 18, 17, 16, 15]);

    truncate_top_k(&mut kept, 10);
    assert_eq!(kept.len(), 5);

    truncate_top_k(&mut kept, 0);
    assert!(kept.is_empty());
}
