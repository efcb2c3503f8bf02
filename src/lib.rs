//! Sightline turns single-stage (YOLO-family) detector output into a short,
//! labeled, de-duplicated list of objects for spoken narration.
//!
//! The crate is CPU-only and synchronous. A frame is resized for the model,
//! handed to an [`InferenceEngine`] supplied by the host, and the output
//! tensor is decoded, filtered by confidence and box geometry, and reduced
//! with greedy non-maximum suppression. Decoding can run on all cores via the
//! `rayon` feature; `tracing` adds per-stage spans and `image-io` adds frame
//! loading through the `image` crate.

pub mod decode;
pub mod engine;
pub mod filter;
pub mod geometry;
pub mod image;
pub mod labels;
pub mod lowlevel;
pub mod pipeline;
pub mod suppress;
pub mod tensor;
mod trace;
pub mod util;

pub use decode::{CoordinateFormat, CoordinateMode, ScoreActivation};
pub use engine::{ChannelLayout, InferenceEngine, InputKind, InputSpec, PixelBuffer};
pub use filter::{GeometryLimits, Thresholds};
pub use geometry::{iou, BoundingBox, CenterBox};
pub use image::{BilinearResizer, FrameView, OwnedFrame, Preprocessor};
pub use labels::{LabelProvider, Labels};
pub use pipeline::{
    Detection, Detector, FrameGeometry, PipelineConfig, Postprocessor, RunnerUp, Stage,
    DEFAULT_MAX_RESULTS,
};
pub use suppress::SuppressionMode;
pub use tensor::{OutputTensor, RawDetectionTensor, TensorLayout};
pub use util::{SightlineError, SightlineResult};
