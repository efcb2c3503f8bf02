//! Inference engine seam.
//!
//! Model loading, tensor allocation and the forward pass belong to whatever
//! runtime the host application embeds. The detector only needs to know
//! whether the engine is usable, what input it expects, and how to run one
//! prepared frame through it.

use crate::tensor::OutputTensor;
use crate::util::{SightlineError, SightlineResult};

/// Element type and value range of the model input tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// `f32` values scaled to `[0, 1]`.
    Float32Normalized,
    /// `u8` values in `[0, 255]`.
    Uint8Raw,
}

impl InputKind {
    /// Maps a runtime dtype name (`"float32"`, `"uint8"`, ...) to an input kind.
    pub fn from_dtype(dtype: &str) -> SightlineResult<Self> {
        match dtype.to_ascii_lowercase().as_str() {
            "float32" | "f32" | "float" => Ok(InputKind::Float32Normalized),
            "uint8" | "u8" => Ok(InputKind::Uint8Raw),
            _ => Err(SightlineError::InvalidConfig(
                "input dtype must be float32 or uint8",
            )),
        }
    }
}

/// Channel order of the model input tensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelLayout {
    /// `[1, 3, H, W]`.
    #[default]
    Nchw,
    /// `[1, H, W, 3]`.
    Nhwc,
}

/// Input tensor description reported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSpec {
    /// Input width in pixels.
    pub width: usize,
    /// Input height in pixels.
    pub height: usize,
    /// Element type.
    pub kind: InputKind,
    /// Channel order.
    pub layout: ChannelLayout,
}

impl InputSpec {
    /// Square float input in NCHW order, the common YOLO export.
    pub fn square_f32(size: usize) -> Self {
        Self {
            width: size,
            height: size,
            kind: InputKind::Float32Normalized,
            layout: ChannelLayout::Nchw,
        }
    }

    /// Validates the dimensions.
    pub fn validate(&self) -> SightlineResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SightlineError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Number of elements of a 3-channel input.
    pub fn num_elements(&self) -> usize {
        self.width * self.height * 3
    }
}

/// Prepared model input.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelBuffer {
    /// Normalized float input.
    F32(Vec<f32>),
    /// Raw byte input.
    U8(Vec<u8>),
}

impl PixelBuffer {
    /// Returns the element count.
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::F32(v) => v.len(),
            PixelBuffer::U8(v) => v.len(),
        }
    }

    /// True when the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the input kind this buffer satisfies.
    pub fn kind(&self) -> InputKind {
        match self {
            PixelBuffer::F32(_) => InputKind::Float32Normalized,
            PixelBuffer::U8(_) => InputKind::Uint8Raw,
        }
    }
}

/// External inference runtime.
///
/// Implementations own the model handle. `is_ready` turning true is the
/// `Uninitialized -> Ready` transition; until then the detector skips frames.
pub trait InferenceEngine {
    /// True once a model is loaded and its tensors are allocated.
    fn is_ready(&self) -> bool;

    /// Describes the expected input tensor.
    fn input_spec(&self) -> SightlineResult<InputSpec>;

    /// Runs one forward pass. This is the only blocking call in a frame.
    fn run(&mut self, input: &PixelBuffer) -> SightlineResult<OutputTensor>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn input_spec(&self) -> SightlineResult<InputSpec> {
        (**self).input_spec()
    }

    fn run(&mut self, input: &PixelBuffer) -> SightlineResult<OutputTensor> {
        (**self).run(input)
    }
}
