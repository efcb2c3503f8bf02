//! Raw detector output tensors.
//!
//! A single-stage detector emits one column per anchor: four box parameters
//! (center x, center y, width, height) followed by one score per class. The
//! canonical layout is channel-major `[C, A]` with `C = 4 + num_classes`, so
//! reading one anchor strides through memory by `A`. Some exports transpose
//! the head to anchor-major `[A, C]`; both are read through the same view.

use crate::util::{SightlineError, SightlineResult};

/// Number of box parameters preceding the class scores.
pub const BOX_CHANNELS: usize = 4;

/// Memory order of a detection tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[C, A]`: all anchors of channel 0, then channel 1, ...
    ChannelsFirst,
    /// `[A, C]`: all channels of anchor 0, then anchor 1, ...
    AnchorsFirst,
}

/// Borrowed 2D view over a detector output buffer.
#[derive(Clone, Copy, Debug)]
pub struct RawDetectionTensor<'a> {
    data: &'a [f32],
    channels: usize,
    anchors: usize,
    layout: TensorLayout,
}

impl<'a> RawDetectionTensor<'a> {
    /// Creates a view with explicit dimensions.
    ///
    /// The buffer length must be exactly `channels * anchors` and there must
    /// be at least one class channel.
    pub fn new(
        data: &'a [f32],
        channels: usize,
        anchors: usize,
        layout: TensorLayout,
    ) -> SightlineResult<Self> {
        if channels <= BOX_CHANNELS {
            return Err(SightlineError::malformed(format!(
                "expected more than {BOX_CHANNELS} channels, got {channels}"
            )));
        }
        if anchors == 0 {
            return Err(SightlineError::malformed("tensor has no anchors"));
        }
        let needed = channels
            .checked_mul(anchors)
            .ok_or_else(|| SightlineError::malformed("tensor size overflows"))?;
        if data.len() != needed {
            return Err(SightlineError::malformed(format!(
                "expected {needed} values for {channels}x{anchors}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            channels,
            anchors,
            layout,
        })
    }

    /// Creates a view from an engine-reported shape.
    ///
    /// Accepts `[C, A]`, `[A, C]` and the same with a leading batch of 1.
    /// When `num_classes` is known, the axis equal to `4 + num_classes` is the
    /// channel axis (channel-first wins when both axes match). Without it the
    /// shorter axis is taken as the channel axis, unless it is too short to
    /// hold a box and a class.
    pub fn from_shape(
        data: &'a [f32],
        shape: &[usize],
        num_classes: Option<usize>,
    ) -> SightlineResult<Self> {
        let dims = match shape {
            [1, d0, d1] | [d0, d1] => (*d0, *d1),
            [batch, _, _] => {
                return Err(SightlineError::malformed(format!(
                    "batch size {batch} is not supported"
                )))
            }
            _ => {
                return Err(SightlineError::malformed(format!(
                    "expected a 2D or 3D shape, got {shape:?}"
                )))
            }
        };

        let (d0, d1) = dims;
        match num_classes {
            Some(classes) => {
                let expected = BOX_CHANNELS + classes;
                if d0 == expected {
                    Self::new(data, d0, d1, TensorLayout::ChannelsFirst)
                } else if d1 == expected {
                    Self::new(data, d1, d0, TensorLayout::AnchorsFirst)
                } else {
                    Err(SightlineError::malformed(format!(
                        "shape {shape:?} has no axis of {expected} channels for {classes} classes"
                    )))
                }
            }
            None => {
                let channels_first = (d0 <= d1 && d0 > BOX_CHANNELS) || d1 <= BOX_CHANNELS;
                if channels_first {
                    Self::new(data, d0, d1, TensorLayout::ChannelsFirst)
                } else {
                    Self::new(data, d1, d0, TensorLayout::AnchorsFirst)
                }
            }
        }
    }

    /// Returns the number of channels (`4 + num_classes`).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the number of anchors.
    pub fn anchors(&self) -> usize {
        self.anchors
    }

    /// Returns the number of class score channels.
    pub fn num_classes(&self) -> usize {
        self.channels - BOX_CHANNELS
    }

    /// Returns the memory layout.
    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns the value at `(channel, anchor)`.
    ///
    /// Panics when either index is out of range.
    #[inline]
    pub fn value(&self, channel: usize, anchor: usize) -> f32 {
        debug_assert!(channel < self.channels && anchor < self.anchors);
        match self.layout {
            TensorLayout::ChannelsFirst => self.data[channel * self.anchors + anchor],
            TensorLayout::AnchorsFirst => self.data[anchor * self.channels + channel],
        }
    }

    /// Returns `[cx, cy, w, h]` for an anchor in the tensor's own units.
    #[inline]
    pub fn box_params(&self, anchor: usize) -> [f32; 4] {
        [
            self.value(0, anchor),
            self.value(1, anchor),
            self.value(2, anchor),
            self.value(3, anchor),
        ]
    }

    /// Returns the raw score of `class_id` at `anchor`.
    #[inline]
    pub fn class_score(&self, anchor: usize, class_id: usize) -> f32 {
        self.value(BOX_CHANNELS + class_id, anchor)
    }
}

/// Owned output as returned by an inference engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputTensor {
    /// Shape reported by the engine, e.g. `[1, 84, 8400]`.
    pub shape: Vec<usize>,
    /// Row-major values.
    pub data: Vec<f32>,
}

impl OutputTensor {
    /// Creates an output tensor.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// Borrows the output as a detection tensor, see [`RawDetectionTensor::from_shape`].
    pub fn view(&self, num_classes: Option<usize>) -> SightlineResult<RawDetectionTensor<'_>> {
        RawDetectionTensor::from_shape(&self.data, &self.shape, num_classes)
    }
}
