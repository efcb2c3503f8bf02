//! Error types for sightline.

use thiserror::Error;

/// Result alias for sightline operations.
pub type SightlineResult<T> = std::result::Result<T, SightlineError>;

/// Errors that can occur while configuring or running the detection pipeline.
///
/// Only the configuration variants are meant to reach the caller of
/// [`crate::Detector::detect`]; per-frame failures are absorbed there and turn
/// into an empty detection list.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SightlineError {
    /// The inference engine has no loaded model or a broken interpreter.
    #[error("inference engine is not ready")]
    EngineNotReady,
    /// The inference engine reported a failure while running a frame.
    #[error("inference engine failed: {0}")]
    Engine(String),
    /// The preprocessed frame does not match the engine's declared input.
    #[error("engine input mismatch: expected {expected} elements, got {got}")]
    InputMismatch {
        /// Element count the engine declared.
        expected: usize,
        /// Element count the preprocessor produced.
        got: usize,
    },
    /// The output tensor does not have the expected shape or length.
    #[error("malformed output tensor: {reason}")]
    MalformedTensor {
        /// Human readable description of the mismatch.
        reason: String,
    },
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A confidence or IoU threshold is outside [0, 1] or not finite.
    #[error("invalid threshold {name}: {value}")]
    InvalidThreshold {
        /// Threshold name (`"global"`, `"iou"` or a class label).
        name: String,
        /// Rejected value.
        value: f32,
    },
    /// Image or frame dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Width in pixels.
        width: usize,
        /// Height in pixels.
        height: usize,
    },
    /// A buffer is shorter than the declared dimensions require.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall {
        /// Required number of elements.
        needed: usize,
        /// Actual number of elements.
        got: usize,
    },
    /// Reading a label file failed.
    #[error("label io error: {reason}")]
    LabelIo {
        /// Underlying error message.
        reason: String,
    },
    /// Decoding an image file failed.
    #[error("image io error: {reason}")]
    ImageIo {
        /// Underlying error message.
        reason: String,
    },
}

impl SightlineError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedTensor {
            reason: reason.into(),
        }
    }
}
