//! Tensor decoding into per-anchor candidates.
//!
//! Decoding is a straight O(A·C) pass with no filtering: every anchor yields
//! exactly one [`Candidate`]. Box parameters are normalized to the model input
//! before anything else looks at them, so downstream stages only ever see
//! fractions of the frame.

use crate::geometry::CenterBox;
use crate::tensor::RawDetectionTensor;
use crate::trace::{trace_event, trace_span};
use crate::util::{SightlineError, SightlineResult};

pub mod format;
#[cfg(feature = "rayon")]
pub mod rayon;
pub mod scores;

pub use format::{detect_coordinate_format, CoordinateFormat, CoordinateMode};
pub use scores::{ClassScore, ScoreActivation};

use scores::top2_classes;

/// One anchor's decoded box and class scores.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Anchor index in the source tensor.
    pub anchor: usize,
    /// Box center and size as fractions of the model input.
    pub center: CenterBox,
    /// Best class id.
    pub class_id: usize,
    /// Confidence of the best class in `[0, 1]`.
    pub confidence: f32,
    /// Second-best class, kept for narration of ambiguous anchors.
    pub runner_up: Option<ClassScore>,
}

/// Parameters for [`decode_candidates`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeParams {
    /// Model input width in pixels (divisor for pixel-space x and width).
    pub input_width: usize,
    /// Model input height in pixels (divisor for pixel-space y and height).
    pub input_height: usize,
    /// Coordinate convention selection.
    pub coordinate_mode: CoordinateMode,
    /// Raw score mapping.
    pub activation: ScoreActivation,
}

impl DecodeParams {
    /// Parameters for a square model input with automatic format detection.
    pub fn square(input_size: usize) -> Self {
        Self {
            input_width: input_size,
            input_height: input_size,
            coordinate_mode: CoordinateMode::Auto,
            activation: ScoreActivation::Identity,
        }
    }

    fn validate(&self) -> SightlineResult<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(SightlineError::InvalidDimensions {
                width: self.input_width,
                height: self.input_height,
            });
        }
        Ok(())
    }
}

/// Candidates for every anchor of one tensor.
#[derive(Clone, Debug)]
pub struct DecodedTensor {
    /// Coordinate convention the tensor was read with.
    pub format: CoordinateFormat,
    /// One candidate per anchor, in anchor order.
    pub candidates: Vec<Candidate>,
}

/// Decodes one anchor after the coordinate format has been fixed.
#[inline]
pub(crate) fn decode_anchor(
    tensor: &RawDetectionTensor<'_>,
    anchor: usize,
    scale: (f32, f32),
    activation: ScoreActivation,
) -> Candidate {
    let [cx, cy, w, h] = tensor.box_params(anchor);
    let center = CenterBox::new(cx, cy, w, h).scaled(scale.0, scale.1);
    let (top, runner_up) = top2_classes(tensor, anchor, activation);
    Candidate {
        anchor,
        center,
        class_id: top.class_id,
        confidence: top.confidence,
        runner_up,
    }
}

/// Resolves the coordinate format and the divisors that normalize it.
pub(crate) fn resolve_scale(
    tensor: &RawDetectionTensor<'_>,
    params: &DecodeParams,
) -> SightlineResult<(CoordinateFormat, (f32, f32))> {
    params.validate()?;
    let format = params.coordinate_mode.resolve(tensor);
    let scale = match format {
        CoordinateFormat::Normalized => (1.0, 1.0),
        CoordinateFormat::Pixels => (params.input_width as f32, params.input_height as f32),
    };
    Ok((format, scale))
}

/// Decodes every anchor of `tensor` into a candidate.
pub fn decode_candidates(
    tensor: &RawDetectionTensor<'_>,
    params: &DecodeParams,
) -> SightlineResult<DecodedTensor> {
    let _span = trace_span!(
        "decode",
        anchors = tensor.anchors(),
        classes = tensor.num_classes()
    )
    .entered();

    let (format, scale) = resolve_scale(tensor, params)?;
    let candidates: Vec<Candidate> = (0..tensor.anchors())
        .map(|anchor| decode_anchor(tensor, anchor, scale, params.activation))
        .collect();

    let pixel_space = format == CoordinateFormat::Pixels;
    trace_event!("decoded", count = candidates.len(), pixel_space = pixel_space);
    Ok(DecodedTensor { format, candidates })
}
