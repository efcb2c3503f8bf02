//! Camera frames and model-input preparation.
//!
//! `FrameView` is a borrowed interleaved RGB image with an explicit stride.
//! The stride counts bytes between the starts of consecutive rows, so a stride
//! larger than `3 * width` represents padded rows as delivered by many camera
//! APIs.

use crate::engine::{InputSpec, PixelBuffer};
use crate::util::{SightlineError, SightlineResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod resize;

pub use resize::BilinearResizer;

/// Bytes per RGB pixel.
pub const RGB_CHANNELS: usize = 3;

/// Converts a camera frame into the engine's input tensor.
pub trait Preprocessor {
    /// Resizes and lays out `frame` as described by `spec`.
    fn prepare(&self, frame: FrameView<'_>, spec: &InputSpec) -> SightlineResult<PixelBuffer>;
}

/// Borrowed RGB frame with an explicit row stride.
#[derive(Copy, Clone, Debug)]
pub struct FrameView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> FrameView<'a> {
    /// Creates a contiguous view with `stride == 3 * width`.
    pub fn from_slice(data: &'a [u8], width: usize, height: usize) -> SightlineResult<Self> {
        let stride = width
            .checked_mul(RGB_CHANNELS)
            .ok_or(SightlineError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, stride)
    }

    /// Creates a view with an explicit stride in bytes.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> SightlineResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(SightlineError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the `3 * width` bytes of row `y`.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * RGB_CHANNELS)?;
        self.data.get(start..end)
    }

    /// Returns the RGB triple at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let i = x * RGB_CHANNELS;
        Some([row[i], row[i + 1], row[i + 2]])
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> SightlineResult<usize> {
    if width == 0 || height == 0 {
        return Err(SightlineError::InvalidDimensions { width, height });
    }
    let row_bytes = width
        .checked_mul(RGB_CHANNELS)
        .ok_or(SightlineError::InvalidDimensions { width, height })?;
    if stride < row_bytes {
        return Err(SightlineError::InvalidConfig(
            "frame stride is shorter than one row of pixels",
        ));
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_bytes))
        .ok_or(SightlineError::InvalidDimensions { width, height })
}

/// Owned contiguous RGB frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedFrame {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedFrame {
    /// Wraps a contiguous RGB buffer of exactly `3 * width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> SightlineResult<Self> {
        let needed = required_len(width, height, width.saturating_mul(RGB_CHANNELS))?;
        if data.len() != needed {
            return Err(SightlineError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns a borrowed view of the frame.
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width * RGB_CHANNELS,
        }
    }

    /// Returns the frame width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
