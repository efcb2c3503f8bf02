use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sightline::lowlevel::{decode_candidates, detect_coordinate_format, DecodeParams};
use sightline::{CoordinateFormat, CoordinateMode, RawDetectionTensor, ScoreActivation, TensorLayout};

/// Builds a channel-first `[4 + classes, anchors]` buffer.
fn channel_first(boxes: &[[f32; 4]], scores: &[Vec<f32>]) -> Vec<f32> {
    let anchors = boxes.len();
    let classes = scores[0].len();
    let mut data = vec![0.0f32; (4 + classes) * anchors];
    for a in 0..anchors {
        for c in 0..4 {
            data[c * anchors + a] = boxes[a][c];
        }
        for k in 0..classes {
            data[(4 + k) * anchors + a] = scores[a][k];
        }
    }
    data
}

#[test]
fn every_anchor_yields_one_normalized_candidate() {
    let mut rng = StdRng::seed_from_u64(7);
    let anchors = 500;
    let classes = 3;
    let boxes: Vec<[f32; 4]> = (0..anchors)
        .map(|_| {
            [
                rng.random_range(0.0..640.0),
                rng.random_range(0.0..640.0),
                rng.random_range(1.0..200.0),
                rng.random_range(1.0..200.0),
            ]
        })
        .collect();
    let scores: Vec<Vec<f32>> = (0..anchors)
        .map(|_| (0..classes).map(|_| rng.random_range(0.0..1.0)).collect())
        .collect();
    let data = channel_first(&boxes, &scores);
    let t = RawDetectionTensor::new(&data, 4 + classes, anchors, TensorLayout::ChannelsFirst)
        .unwrap();

    let decoded = decode_candidates(&t, &DecodeParams::square(640)).unwrap();
    assert_eq!(decoded.format, CoordinateFormat::Pixels);
    assert_eq!(decoded.candidates.len(), anchors);
    for (i, c) in decoded.candidates.iter().enumerate() {
        assert_eq!(c.anchor, i);
        assert!((0.0..=1.0).contains(&c.center.cx));
        assert!((0.0..=1.0).contains(&c.center.cy));
        assert!(c.center.w > 0.0 && c.center.w <= 1.0);
        assert!((0.0..=1.0).contains(&c.confidence));
    }
}

#[test]
fn pixel_coordinates_are_divided_by_input_size() {
    let data = channel_first(&[[320.0, 320.0, 64.0, 64.0]], &[vec![0.8]]);
    let t = RawDetectionTensor::new(&data, 5, 1, TensorLayout::ChannelsFirst).unwrap();
    let c = decode_candidates(&t, &DecodeParams::square(640))
        .unwrap()
        .candidates[0];
    assert!((c.center.cx - 0.5).abs() < 1e-6);
    assert!((c.center.cy - 0.5).abs() < 1e-6);
    assert!((c.center.w - 0.1).abs() < 1e-6);
    assert!((c.center.h - 0.1).abs() < 1e-6);
}

#[test]
fn normalized_coordinates_pass_through() {
    let data = channel_first(
        &[[0.5, 0.5, 0.2, 0.3], [0.1, 0.9, 0.05, 0.05]],
        &[vec![0.6, 0.1], vec![0.2, 0.7]],
    );
    let t = RawDetectionTensor::new(&data, 6, 2, TensorLayout::ChannelsFirst).unwrap();
    assert_eq!(detect_coordinate_format(&t), CoordinateFormat::Normalized);

    let decoded = decode_candidates(&t, &DecodeParams::square(640)).unwrap();
    let c = decoded.candidates[0];
    assert!((c.center.h - 0.3).abs() < 1e-6);
    assert_eq!(decoded.candidates[1].class_id, 1);
}

#[test]
fn anchor_first_layout_decodes_identically() {
    let boxes = [[0.5, 0.5, 0.2, 0.3], [0.1, 0.9, 0.05, 0.05]];
    let scores = [vec![0.6, 0.1], vec![0.2, 0.7]];
    let cf = channel_first(&boxes, &scores);
    let mut af = Vec::new();
    for a in 0..2 {
        af.extend_from_slice(&boxes[a]);
        af.extend_from_slice(&scores[a]);
    }
    let t_cf = RawDetectionTensor::new(&cf, 6, 2, TensorLayout::ChannelsFirst).unwrap();
    let t_af = RawDetectionTensor::new(&af, 6, 2, TensorLayout::AnchorsFirst).unwrap();

    let params = DecodeParams::square(640);
    let a = decode_candidates(&t_cf, &params).unwrap().candidates;
    let b = decode_candidates(&t_af, &params).unwrap().candidates;
    assert_eq!(a, b);
}

#[test]
fn pinned_mode_overrides_detection() {
    // Pixel-space tensor whose box sits entirely in the top-left pixel.
    let data = channel_first(&[[0.5, 0.5, 1.0, 1.0]], &[vec![0.9]]);
    let t = RawDetectionTensor::new(&data, 5, 1, TensorLayout::ChannelsFirst).unwrap();
    let params = DecodeParams {
        coordinate_mode: CoordinateMode::Pixels,
        ..DecodeParams::square(640)
    };
    let decoded = decode_candidates(&t, &params).unwrap();
    assert_eq!(decoded.format, CoordinateFormat::Pixels);
    assert!((decoded.candidates[0].center.w - 1.0 / 640.0).abs() < 1e-7);
}

#[test]
fn ties_and_single_class_heads() {
    let data = channel_first(&[[0.5, 0.5, 0.2, 0.2]], &[vec![0.4, 0.4, 0.1]]);
    let t = RawDetectionTensor::new(&data, 7, 1, TensorLayout::ChannelsFirst).unwrap();
    let c = decode_candidates(&t, &DecodeParams::square(640))
        .unwrap()
        .candidates[0];
    assert_eq!(c.class_id, 0);
    assert_eq!(c.runner_up.unwrap().class_id, 1);

    let data = channel_first(&[[0.5, 0.5, 0.2, 0.2]], &[vec![0.4]]);
    let t = RawDetectionTensor::new(&data, 5, 1, TensorLayout::ChannelsFirst).unwrap();
    let c = decode_candidates(&t, &DecodeParams::square(640))
        .unwrap()
        .candidates[0];
    assert!(c.runner_up.is_none());
}

#[test]
fn sigmoid_activation_maps_logits() {
    let data = channel_first(&[[0.5, 0.5, 0.2, 0.2]], &[vec![0.0, 2.0]]);
    let t = RawDetectionTensor::new(&data, 6, 1, TensorLayout::ChannelsFirst).unwrap();
    let params = DecodeParams {
        activation: ScoreActivation::Sigmoid,
        ..DecodeParams::square(640)
    };
    let c = decode_candidates(&t, &params).unwrap().candidates[0];
    assert_eq!(c.class_id, 1);
    assert!((c.confidence - 0.880_797).abs() < 1e-5);
    assert!((c.runner_up.unwrap().confidence - 0.5).abs() < 1e-6);
}
