//! Scalar bilinear resize to the model input.
//!
//! Sampling uses pixel-center alignment: destination pixel `x` maps to source
//! coordinate `(x + 0.5) * src_w / dst_w - 0.5`, clamped to the frame. The
//! frame is stretched to the input resolution without letterboxing, so boxes
//! normalized to the model input are also normalized to the source frame.

use crate::engine::{ChannelLayout, InputKind, InputSpec, PixelBuffer};
use crate::image::{FrameView, Preprocessor, RGB_CHANNELS};
use crate::trace::trace_span;
use crate::util::{SightlineError, SightlineResult};

/// Bilinear preprocessor for interleaved RGB frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct BilinearResizer;

/// Source sample positions and weights along one axis.
struct AxisTaps {
    lo: Vec<usize>,
    hi: Vec<usize>,
    frac: Vec<f32>,
}

impl AxisTaps {
    fn new(src_len: usize, dst_len: usize) -> Self {
        let scale = src_len as f32 / dst_len as f32;
        let max = (src_len - 1) as f32;
        let mut lo = Vec::with_capacity(dst_len);
        let mut hi = Vec::with_capacity(dst_len);
        let mut frac = Vec::with_capacity(dst_len);
        for i in 0..dst_len {
            let pos = ((i as f32 + 0.5) * scale - 0.5).clamp(0.0, max);
            let l = pos.floor() as usize;
            lo.push(l);
            hi.push((l + 1).min(src_len - 1));
            frac.push(pos - l as f32);
        }
        Self { lo, hi, frac }
    }
}

impl BilinearResizer {
    /// Resizes into `0..=255` float samples in the requested layout.
    fn resample(frame: FrameView<'_>, spec: &InputSpec) -> SightlineResult<Vec<f32>> {
        let (dst_w, dst_h) = (spec.width, spec.height);
        let xs = AxisTaps::new(frame.width(), dst_w);
        let ys = AxisTaps::new(frame.height(), dst_h);
        let plane = dst_w * dst_h;
        let mut out = vec![0.0f32; plane * RGB_CHANNELS];
        let invalid = SightlineError::InvalidDimensions {
            width: frame.width(),
            height: frame.height(),
        };

        for y in 0..dst_h {
            let row0 = frame.row(ys.lo[y]).ok_or_else(|| invalid.clone())?;
            let row1 = frame.row(ys.hi[y]).ok_or_else(|| invalid.clone())?;
            let fy = ys.frac[y];
            for x in 0..dst_w {
                let (x0, x1, fx) = (xs.lo[x] * RGB_CHANNELS, xs.hi[x] * RGB_CHANNELS, xs.frac[x]);
                for c in 0..RGB_CHANNELS {
                    let top = f32::from(row0[x0 + c]) * (1.0 - fx) + f32::from(row0[x1 + c]) * fx;
                    let bottom =
                        f32::from(row1[x0 + c]) * (1.0 - fx) + f32::from(row1[x1 + c]) * fx;
                    let value = top * (1.0 - fy) + bottom * fy;
                    let idx = match spec.layout {
                        ChannelLayout::Nchw => c * plane + y * dst_w + x,
                        ChannelLayout::Nhwc => (y * dst_w + x) * RGB_CHANNELS + c,
                    };
                    out[idx] = value;
                }
            }
        }
        Ok(out)
    }
}

impl Preprocessor for BilinearResizer {
    fn prepare(&self, frame: FrameView<'_>, spec: &InputSpec) -> SightlineResult<PixelBuffer> {
        spec.validate()?;
        let _span = trace_span!(
            "preprocess",
            src_w = frame.width(),
            src_h = frame.height(),
            dst_w = spec.width,
            dst_h = spec.height
        )
        .entered();

        let samples = Self::resample(frame, spec)?;
        Ok(match spec.kind {
            InputKind::Float32Normalized => {
                PixelBuffer::F32(samples.into_iter().map(|v| v / 255.0).collect())
            }
            InputKind::Uint8Raw => PixelBuffer::U8(
                samples
                    .into_iter()
                    .map(|v| v.round().clamp(0.0, 255.0) as u8)
                    .collect(),
            ),
        })
    }
}
