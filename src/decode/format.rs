//! Box coordinate convention detection.
//!
//! Exported detectors disagree on whether box parameters are fractions of the
//! model input or pixels of it. The auto mode peeks at a strided sample of
//! anchors once per tensor: any finite value above 1 means pixel space.
//!
//! This is a heuristic. A pixel-space tensor whose sampled anchors all sit in
//! the top-left pixel would be read as normalized; callers that know their
//! export should pin the convention with [`CoordinateMode`].

use crate::tensor::RawDetectionTensor;

/// Maximum number of anchors inspected by [`detect_coordinate_format`].
pub const FORMAT_SAMPLE_ANCHORS: usize = 256;

/// Slack above 1.0 still treated as normalized (float noise from exports).
const NORMALIZED_TOLERANCE: f32 = 1e-3;

/// How the decoder picks the coordinate convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoordinateMode {
    /// Inspect the tensor once and decide.
    #[default]
    Auto,
    /// Box parameters are already fractions of the model input.
    Normalized,
    /// Box parameters are pixels of the model input resolution.
    Pixels,
}

/// Coordinate convention of a particular tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinateFormat {
    /// Values in `[0, 1]`.
    Normalized,
    /// Values in `[0, input_size]`.
    Pixels,
}

impl CoordinateMode {
    /// Resolves the mode against a tensor, sampling only for [`CoordinateMode::Auto`].
    pub fn resolve(self, tensor: &RawDetectionTensor<'_>) -> CoordinateFormat {
        match self {
            CoordinateMode::Auto => detect_coordinate_format(tensor),
            CoordinateMode::Normalized => CoordinateFormat::Normalized,
            CoordinateMode::Pixels => CoordinateFormat::Pixels,
        }
    }
}

/// Guesses the coordinate convention from a strided anchor sample.
pub fn detect_coordinate_format(tensor: &RawDetectionTensor<'_>) -> CoordinateFormat {
    let anchors = tensor.anchors();
    let step = (anchors / FORMAT_SAMPLE_ANCHORS).max(1);
    for anchor in (0..anchors).step_by(step).take(FORMAT_SAMPLE_ANCHORS) {
        let out_of_unit = tensor
            .box_params(anchor)
            .iter()
            .any(|v| v.is_finite() && *v > 1.0 + NORMALIZED_TOLERANCE);
        if out_of_unit {
            return CoordinateFormat::Pixels;
        }
    }
    CoordinateFormat::Normalized
}
