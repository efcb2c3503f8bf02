//! Rayon-parallel decoding (feature-gated).
//!
//! Anchors are independent, so the class scan parallelizes over anchor index.
//! The indexed collect keeps anchor order, which makes the output identical to
//! [`crate::decode::decode_candidates`] and keeps NMS tie-breaking stable.

use crate::decode::{decode_anchor, resolve_scale, Candidate, DecodeParams, DecodedTensor};
use crate::tensor::RawDetectionTensor;
use crate::trace::{trace_event, trace_span};
use crate::util::SightlineResult;
use rayon::prelude::*;

/// Anchor-parallel variant of [`crate::decode::decode_candidates`].
pub fn decode_candidates_par(
    tensor: &RawDetectionTensor<'_>,
    params: &DecodeParams,
) -> SightlineResult<DecodedTensor> {
    let _span = trace_span!(
        "decode_par",
        anchors = tensor.anchors(),
        classes = tensor.num_classes()
    )
    .entered();

    let (format, scale) = resolve_scale(tensor, params)?;
    let activation = params.activation;
    let candidates: Vec<Candidate> = (0..tensor.anchors())
        .into_par_iter()
        .map(|anchor| decode_anchor(tensor, anchor, scale, activation))
        .collect();

    trace_event!("decoded", count = candidates.len());
    Ok(DecodedTensor { format, candidates })
}
