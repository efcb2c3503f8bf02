use sightline::{
    iou, BoundingBox, CenterBox, FrameView, LabelProvider, Labels, OutputTensor,
    RawDetectionTensor, SightlineError, TensorLayout, Thresholds,
};

#[test]
fn frame_view_rejects_invalid_dimensions() {
    let data = [0u8; 12];

    let err = FrameView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        SightlineError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = FrameView::from_slice(&data, 2, 3).err().unwrap();
    assert_eq!(err, SightlineError::BufferTooSmall { needed: 18, got: 12 });
}

#[test]
fn center_and_corner_boxes_convert_both_ways() {
    let center = CenterBox::new(0.5, 0.4, 0.2, 0.4);
    let bbox = center.to_bbox();
    assert!((bbox.left - 0.4).abs() < 1e-6);
    assert!((bbox.top - 0.2).abs() < 1e-6);
    assert!((bbox.right - 0.6).abs() < 1e-6);
    assert!((bbox.bottom - 0.6).abs() < 1e-6);

    let back = bbox.to_center();
    assert!((back.cx - center.cx).abs() < 1e-6);
    assert!((back.h - center.h).abs() < 1e-6);
}

#[test]
fn iou_properties() {
    let a = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
    let b = BoundingBox::new(0.25, 0.0, 0.75, 0.5);
    let far = BoundingBox::new(0.8, 0.8, 0.9, 0.9);
    let degenerate = BoundingBox::new(0.3, 0.3, 0.3, 0.6);

    assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    assert_eq!(iou(&a, &far), 0.0);
    assert_eq!(iou(&a, &degenerate), 0.0);
    assert!((iou(&a, &b) - iou(&b, &a)).abs() < 1e-7);
    // overlap 0.125, union 0.375
    assert!((iou(&a, &b) - 1.0 / 3.0).abs() < 1e-6);
}

#[test]
fn tensor_views_require_consistent_shapes() {
    let data = vec![0.0f32; 6 * 4];
    let t = RawDetectionTensor::new(&data, 6, 4, TensorLayout::ChannelsFirst).unwrap();
    assert_eq!(t.num_classes(), 2);

    let err = RawDetectionTensor::new(&data, 4, 6, TensorLayout::ChannelsFirst).unwrap_err();
    assert!(matches!(err, SightlineError::MalformedTensor { .. }));

    let out = OutputTensor::new(vec![1, 4, 6], data.clone());
    let t = out.view(Some(2)).unwrap();
    assert_eq!(t.layout(), TensorLayout::AnchorsFirst);
    assert_eq!(t.anchors(), 4);
}

#[test]
fn labels_keep_interior_gaps() {
    let labels = Labels::from_text("person\n\ncar\n\n\n");
    assert_eq!(labels.len(), 3);
    assert_eq!(labels.label(0), Some("person"));
    assert_eq!(labels.label(1), Some(""));
    assert_eq!(labels.label(2), Some("car"));
    assert_eq!(labels.class_id("car"), Some(2));
    assert_eq!(labels.label(3), None);
}

#[test]
fn thresholds_validate_range() {
    assert!(Thresholds::new(0.0).is_ok());
    assert!(Thresholds::new(1.0).is_ok());
    assert!(matches!(
        Thresholds::new(1.5),
        Err(SightlineError::InvalidThreshold { .. })
    ));
    assert!(Thresholds::new(0.5)
        .unwrap()
        .with_override("person", f32::NAN)
        .is_err());
}
