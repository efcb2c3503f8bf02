#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sightline::lowlevel::{decode_candidates, decode_candidates_par, DecodeParams};
use sightline::{
    FrameGeometry, InputSpec, Labels, OutputTensor, PipelineConfig, Postprocessor, Thresholds,
};

const CLASSES: usize = 80;
const ANCHORS: usize = 2100;

fn random_output(seed: u64) -> OutputTensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let channels = 4 + CLASSES;
    let mut data = vec![0.0f32; channels * ANCHORS];
    for a in 0..ANCHORS {
        data[a] = rng.random_range(0.0..640.0);
        data[ANCHORS + a] = rng.random_range(0.0..640.0);
        data[2 * ANCHORS + a] = rng.random_range(8.0..320.0);
        data[3 * ANCHORS + a] = rng.random_range(8.0..320.0);
        for k in 0..CLASSES {
            // Mostly background with a few confident anchors.
            let score = if rng.random_bool(0.02) {
                rng.random_range(0.3..1.0)
            } else {
                rng.random_range(0.0..0.1)
            };
            data[(4 + k) * ANCHORS + a] = score;
        }
    }
    OutputTensor::new(vec![1, channels, ANCHORS], data)
}

#[test]
fn parallel_decode_matches_sequential() {
    let output = random_output(11);
    let tensor = output.view(Some(CLASSES)).unwrap();
    let params = DecodeParams::square(640);

    let seq = decode_candidates(&tensor, &params).unwrap();
    let par = decode_candidates_par(&tensor, &params).unwrap();
    assert_eq!(seq.format, par.format);
    assert_eq!(seq.candidates, par.candidates);
}

#[test]
fn parallel_pipeline_matches_sequential() {
    let labels = Labels::new((0..CLASSES).map(|i| format!("c{i}")));
    let geometry = FrameGeometry::new(&InputSpec::square_f32(640), 1920, 1080);
    let thresholds = Thresholds::new(0.3).unwrap();

    let seq = Postprocessor::new(labels.clone(), PipelineConfig::default()).unwrap();
    let par = Postprocessor::new(
        labels,
        PipelineConfig {
            parallel: true,
            ..PipelineConfig::default()
        },
    )
    .unwrap();

    for seed in [1u64, 2, 3] {
        let output = random_output(seed);
        let a = seq.run_output(&output, geometry, &thresholds, 20).unwrap();
        let b = par.run_output(&output, geometry, &thresholds, 20).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }
}
