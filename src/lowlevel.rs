//! Individual pipeline stages for hosts that assemble their own flow.
//!
//! Most users should prefer [`crate::Detector`] or [`crate::Postprocessor`].
//! These re-exports allow decoding, filtering and suppression to be called
//! separately, e.g. to inspect rejected candidates or reuse NMS on boxes
//! produced elsewhere.

pub use crate::decode::format::FORMAT_SAMPLE_ANCHORS;
#[cfg(feature = "rayon")]
pub use crate::decode::rayon::decode_candidates_par;
pub use crate::decode::{
    decode_candidates, detect_coordinate_format, Candidate, ClassScore, DecodeParams,
    DecodedTensor,
};
pub use crate::filter::{
    filter_candidates, passes_confidence, Accepted, ClassThresholds,
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_ASPECT_RATIO, DEFAULT_MIN_BOX_PX,
};
pub use crate::suppress::{
    nms, suppress, truncate_top_k, validate_iou_threshold, DEFAULT_IOU_THRESHOLD,
};
pub use crate::tensor::BOX_CHANNELS;
