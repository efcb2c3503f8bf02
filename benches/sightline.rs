use criterion::{criterion_group, criterion_main, Criterion};
use sightline::lowlevel::{decode_candidates, nms, Accepted, DecodeParams};
use sightline::{
    BilinearResizer, BoundingBox, FrameGeometry, FrameView, InputSpec, Labels, OutputTensor,
    PipelineConfig, Postprocessor, Preprocessor, Thresholds, DEFAULT_MAX_RESULTS,
};
use std::hint::black_box;

const CLASSES: usize = 80;
const ANCHORS: usize = 8400;

/// Deterministic `[1, 84, 8400]` output with a sprinkling of confident anchors.
fn make_output() -> OutputTensor {
    let channels = 4 + CLASSES;
    let mut data = vec![0.0f32; channels * ANCHORS];
    for a in 0..ANCHORS {
        let h = ((a as u64).wrapping_mul(2_654_435_761) & 0xFFFF) as usize;
        data[a] = (h % 640) as f32;
        data[ANCHORS + a] = ((h / 7) % 640) as f32;
        data[2 * ANCHORS + a] = 20.0 + (h % 200) as f32;
        data[3 * ANCHORS + a] = 20.0 + ((h / 3) % 200) as f32;
        for k in 0..CLASSES {
            let v = ((a * 31 + k * 17) % 1000) as f32 / 1000.0;
            data[(4 + k) * ANCHORS + a] = if v > 0.995 { v } else { v * 0.1 };
        }
    }
    OutputTensor::new(vec![1, channels, ANCHORS], data)
}

fn bench_decode(c: &mut Criterion) {
    let output = make_output();
    let tensor = output.view(Some(CLASSES)).unwrap();
    let params = DecodeParams::square(640);

    c.bench_function("decode_84x8400", |b| {
        b.iter(|| black_box(decode_candidates(black_box(&tensor), &params).unwrap()))
    });

    #[cfg(feature = "rayon")]
    c.bench_function("decode_84x8400_par", |b| {
        b.iter(|| {
            black_box(
                sightline::lowlevel::decode_candidates_par(black_box(&tensor), &params).unwrap(),
            )
        })
    });
}

fn bench_postprocess(c: &mut Criterion) {
    let output = make_output();
    let labels = Labels::new((0..CLASSES).map(|i| format!("class{i}")));
    let post = Postprocessor::new(labels, PipelineConfig::default()).unwrap();
    let geometry = FrameGeometry::new(&InputSpec::square_f32(640), 1280, 720);
    let thresholds = Thresholds::default();

    c.bench_function("postprocess_84x8400", |b| {
        b.iter(|| {
            black_box(
                post.run_output(
                    black_box(&output),
                    geometry,
                    &thresholds,
                    DEFAULT_MAX_RESULTS,
                )
                .unwrap(),
            )
        })
    });
}

fn bench_nms(c: &mut Criterion) {
    let boxes: Vec<Accepted> = (0..300)
        .map(|i| {
            let x = (i % 20) as f32 * 0.045;
            let y = (i / 20) as f32 * 0.06;
            Accepted {
                anchor: i,
                bbox: BoundingBox::new(x, y, x + 0.1, y + 0.1),
                class_id: i % 5,
                confidence: 0.3 + (i % 70) as f32 * 0.01,
                runner_up: None,
            }
        })
        .collect();

    c.bench_function("nms_300", |b| {
        b.iter(|| black_box(nms(black_box(boxes.clone()), 0.45)))
    });
}

fn bench_preprocess(c: &mut Criterion) {
    let (w, h) = (1280, 720);
    let frame_data: Vec<u8> = (0..w * h * 3).map(|i| (i % 251) as u8).collect();
    let frame = FrameView::from_slice(&frame_data, w, h).unwrap();
    let spec = InputSpec::square_f32(640);

    c.bench_function("resize_1280x720_to_640", |b| {
        b.iter(|| black_box(BilinearResizer.prepare(black_box(frame), &spec).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_decode,
    bench_postprocess,
    bench_nms,
    bench_preprocess
);
criterion_main!(benches);
