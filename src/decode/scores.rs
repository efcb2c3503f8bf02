//! Per-anchor class scoring.

use crate::tensor::RawDetectionTensor;

/// Mapping applied to raw class scores before they become confidences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreActivation {
    /// Scores are already probabilities (YOLOv8-style heads).
    #[default]
    Identity,
    /// Scores are logits.
    Sigmoid,
}

impl ScoreActivation {
    /// Maps a raw score into `[0, 1]`; NaN maps to 0.
    #[inline]
    pub fn apply(self, raw: f32) -> f32 {
        let value = match self {
            ScoreActivation::Identity => raw,
            ScoreActivation::Sigmoid => 1.0 / (1.0 + (-raw).exp()),
        };
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }
}

/// A class id with its activated confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassScore {
    /// Class index into the label list.
    pub class_id: usize,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Finds the best and second-best classes of one anchor.
///
/// Single pass with a running max and second max; NaN scores never win. On
/// equal scores the lower class id ranks first. The runner-up is `None` when
/// the tensor has a single class.
pub(crate) fn top2_classes(
    tensor: &RawDetectionTensor<'_>,
    anchor: usize,
    activation: ScoreActivation,
) -> (ClassScore, Option<ClassScore>) {
    let mut best: Option<(usize, f32)> = None;
    let mut second: Option<(usize, f32)> = None;

    for class_id in 0..tensor.num_classes() {
        let score = tensor.class_score(anchor, class_id);
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {
                if second.map_or(true, |(_, s)| score > s) {
                    second = Some((class_id, score));
                }
            }
            _ => {
                second = best;
                best = Some((class_id, score));
            }
        }
    }

    let top = match best {
        Some((class_id, raw)) => ClassScore {
            class_id,
            confidence: activation.apply(raw),
        },
        None => ClassScore {
            class_id: 0,
            confidence: 0.0,
        },
    };
    let runner_up = second.map(|(class_id, raw)| ClassScore {
        class_id,
        confidence: activation.apply(raw),
    });
    (top, runner_up)
}
