//! Convenience helpers for loading frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{FrameView, OwnedFrame};
use crate::util::{SightlineError, SightlineResult};
use std::path::Path;

/// Creates a borrowed view from an RGB image buffer.
pub fn view_from_rgb_image(img: &image::RgbImage) -> SightlineResult<FrameView<'_>> {
    FrameView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Creates an owned RGB frame from a dynamic image, dropping alpha.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> SightlineResult<OwnedFrame> {
    let rgb = img.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    OwnedFrame::new(rgb.into_raw(), width, height)
}

/// Loads an image from disk as an RGB frame.
pub fn load_rgb_frame<P: AsRef<Path>>(path: P) -> SightlineResult<OwnedFrame> {
    let img = image::open(path).map_err(|err| SightlineError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}
