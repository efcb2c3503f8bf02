//! Frame-to-detections orchestration.
//!
//! A frame goes through `Idle -> Decoding -> Filtering -> Suppressing -> Done`.
//! [`Postprocessor`] covers everything after inference and works on any
//! output tensor; [`Detector`] adds the preprocessing and engine steps in
//! front of it and turns every per-frame failure into an empty result.

use crate::decode::{decode_candidates, DecodeParams};
use crate::engine::{InferenceEngine, InputSpec};
use crate::filter::{filter_candidates, Accepted, Thresholds};
use crate::geometry::BoundingBox;
use crate::image::{FrameView, Preprocessor};
use crate::labels::LabelProvider;
use crate::suppress::{suppress, truncate_top_k};
use crate::tensor::{OutputTensor, RawDetectionTensor};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{SightlineError, SightlineResult};

mod config;

pub use config::{PipelineConfig, DEFAULT_MAX_RESULTS};

/// Per-call progress through the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    /// No frame in flight.
    #[default]
    Idle,
    /// Reading anchors out of the output tensor.
    Decoding,
    /// Applying confidence and geometry rules.
    Filtering,
    /// Removing overlapping duplicates.
    Suppressing,
    /// Detections produced.
    Done,
}

impl Stage {
    /// Stable lowercase name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Decoding => "decoding",
            Stage::Filtering => "filtering",
            Stage::Suppressing => "suppressing",
            Stage::Done => "done",
        }
    }
}

/// Second-best class of a detection.
#[derive(Clone, Debug, PartialEq)]
pub struct RunnerUp {
    /// Class id.
    pub class_id: usize,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Resolved label.
    pub label: String,
}

/// A labeled, de-duplicated object in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Box normalized to the source frame.
    pub bbox: BoundingBox,
    /// Class id.
    pub class_id: usize,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Resolved label.
    pub label: String,
    /// Next most likely class for the same box, if the head has one.
    pub runner_up: Option<RunnerUp>,
}

/// Model input and source frame sizes for one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Model input width in pixels.
    pub input_width: usize,
    /// Model input height in pixels.
    pub input_height: usize,
    /// Source frame width in pixels.
    pub image_width: usize,
    /// Source frame height in pixels.
    pub image_height: usize,
}

impl FrameGeometry {
    /// Geometry for a frame fed to a model with input `spec`.
    pub fn new(spec: &InputSpec, image_width: usize, image_height: usize) -> Self {
        Self {
            input_width: spec.width,
            input_height: spec.height,
            image_width,
            image_height,
        }
    }

    fn validate(&self) -> SightlineResult<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(SightlineError::InvalidDimensions {
                width: self.image_width,
                height: self.image_height,
            });
        }
        Ok(())
    }
}

fn resolve_label<L: LabelProvider + ?Sized>(labels: &L, class_id: usize) -> String {
    labels
        .label(class_id)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("class {class_id}"))
}

/// Decode, filter, suppress and label an output tensor.
#[derive(Clone, Debug)]
pub struct Postprocessor<L> {
    labels: L,
    config: PipelineConfig,
}

impl<L: LabelProvider> Postprocessor<L> {
    /// Creates a postprocessor after validating `config`.
    pub fn new(labels: L, config: PipelineConfig) -> SightlineResult<Self> {
        config.validate()?;
        Ok(Self { labels, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the label provider.
    pub fn labels(&self) -> &L {
        &self.labels
    }

    /// Class count to expect in output tensors, if labels are known.
    pub fn expected_classes(&self) -> Option<usize> {
        (!self.labels.is_empty()).then(|| self.labels.len())
    }

    /// Interprets an engine output and runs the pipeline on it.
    pub fn run_output(
        &self,
        output: &OutputTensor,
        geometry: FrameGeometry,
        thresholds: &Thresholds,
        max_results: usize,
    ) -> SightlineResult<Vec<Detection>> {
        let tensor = output.view(self.expected_classes())?;
        self.run(&tensor, geometry, thresholds, max_results)
    }

    /// Runs the pipeline on a tensor.
    pub fn run(
        &self,
        tensor: &RawDetectionTensor<'_>,
        geometry: FrameGeometry,
        thresholds: &Thresholds,
        max_results: usize,
    ) -> SightlineResult<Vec<Detection>> {
        self.run_observed(tensor, geometry, thresholds, max_results, &mut |_| {})
    }

    /// Runs the pipeline, reporting each stage transition to `observe`.
    pub fn run_observed(
        &self,
        tensor: &RawDetectionTensor<'_>,
        geometry: FrameGeometry,
        thresholds: &Thresholds,
        max_results: usize,
        observe: &mut dyn FnMut(Stage),
    ) -> SightlineResult<Vec<Detection>> {
        let _span = trace_span!("postprocess", anchors = tensor.anchors()).entered();
        let mut enter = |stage: Stage| {
            trace_event!("stage", stage = stage.as_str());
            observe(stage);
        };

        enter(Stage::Decoding);
        geometry.validate()?;
        let params = DecodeParams {
            input_width: geometry.input_width,
            input_height: geometry.input_height,
            coordinate_mode: self.config.coordinate_mode,
            activation: self.config.activation,
        };
        let decoded = self.decode(tensor, &params)?;

        enter(Stage::Filtering);
        let class_thresholds = thresholds.resolve(&self.labels, tensor.num_classes());
        let accepted = filter_candidates(
            decoded.candidates,
            &class_thresholds,
            &self.config.geometry,
            (geometry.image_width, geometry.image_height),
        );

        enter(Stage::Suppressing);
        let mut kept = suppress(
            accepted,
            self.config.iou_threshold,
            self.config.suppression,
        );
        truncate_top_k(&mut kept, max_results);

        let detections: Vec<Detection> = kept.into_iter().map(|a| self.label(a)).collect();
        enter(Stage::Done);
        Ok(detections)
    }

    #[cfg(feature = "rayon")]
    fn decode(
        &self,
        tensor: &RawDetectionTensor<'_>,
        params: &DecodeParams,
    ) -> SightlineResult<crate::decode::DecodedTensor> {
        if self.config.parallel {
            crate::decode::rayon::decode_candidates_par(tensor, params)
        } else {
            decode_candidates(tensor, params)
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn decode(
        &self,
        tensor: &RawDetectionTensor<'_>,
        params: &DecodeParams,
    ) -> SightlineResult<crate::decode::DecodedTensor> {
        decode_candidates(tensor, params)
    }

    fn label(&self, accepted: Accepted) -> Detection {
        Detection {
            bbox: accepted.bbox,
            class_id: accepted.class_id,
            confidence: accepted.confidence,
            label: resolve_label(&self.labels, accepted.class_id),
            runner_up: accepted.runner_up.map(|r| RunnerUp {
                class_id: r.class_id,
                confidence: r.confidence,
                label: resolve_label(&self.labels, r.class_id),
            }),
        }
    }
}

/// Full frame pipeline around an inference engine.
///
/// `detect` takes `&mut self`, so one detector processes one frame at a time;
/// hosts that feed a live camera drop frames while a call is running. Nothing
/// but the engine's input description is kept between calls.
pub struct Detector<E, P, L> {
    engine: E,
    preprocessor: P,
    post: Postprocessor<L>,
    input: Option<InputSpec>,
    stage: Stage,
}

impl<E, P, L> Detector<E, P, L>
where
    E: InferenceEngine,
    P: Preprocessor,
    L: LabelProvider,
{
    /// Creates a detector; fails on invalid configuration.
    pub fn new(engine: E, preprocessor: P, labels: L, config: PipelineConfig) -> SightlineResult<Self> {
        Ok(Self {
            engine,
            preprocessor,
            post: Postprocessor::new(labels, config)?,
            input: None,
            stage: Stage::Idle,
        })
    }

    /// Returns the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the engine mutably, e.g. to load a model.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Returns the postprocessing half of the pipeline.
    pub fn postprocessor(&self) -> &Postprocessor<L> {
        &self.post
    }

    /// Stage reached by the most recent call (`Done` after success).
    pub fn last_stage(&self) -> Stage {
        self.stage
    }

    /// Detects objects in `frame`, returning at most `max_results` entries.
    ///
    /// Never fails: an unready engine, a malformed tensor or any other
    /// per-frame problem yields an empty list and a warning event.
    pub fn detect(
        &mut self,
        frame: FrameView<'_>,
        thresholds: &Thresholds,
        max_results: usize,
    ) -> Vec<Detection> {
        match self.try_detect(frame, thresholds, max_results) {
            Ok(detections) => detections,
            Err(err) => {
                trace_warn!("dropping frame at stage {}: {}", self.stage.as_str(), err);
                Vec::new()
            }
        }
    }

    /// Same as [`Detector::detect`] but reports why a frame produced nothing.
    pub fn try_detect(
        &mut self,
        frame: FrameView<'_>,
        thresholds: &Thresholds,
        max_results: usize,
    ) -> SightlineResult<Vec<Detection>> {
        self.stage = Stage::Idle;
        let _span = trace_span!("detect", width = frame.width(), height = frame.height()).entered();

        if !self.engine.is_ready() {
            self.input = None;
            return Err(SightlineError::EngineNotReady);
        }
        let spec = self.input_spec()?;

        let input = self.preprocessor.prepare(frame, &spec)?;
        if input.kind() != spec.kind || input.len() != spec.num_elements() {
            return Err(SightlineError::InputMismatch {
                expected: spec.num_elements(),
                got: input.len(),
            });
        }

        let output = self.engine.run(&input)?;
        let geometry = FrameGeometry::new(&spec, frame.width(), frame.height());
        let tensor = output.view(self.post.expected_classes());

        let stage = &mut self.stage;
        let mut observe = |s: Stage| *stage = s;
        let tensor = match tensor {
            Ok(tensor) => tensor,
            Err(err) => {
                observe(Stage::Decoding);
                return Err(err);
            }
        };
        self.post
            .run_observed(&tensor, geometry, thresholds, max_results, &mut observe)
    }

    fn input_spec(&mut self) -> SightlineResult<InputSpec> {
        if let Some(spec) = self.input {
            return Ok(spec);
        }
        let spec = self.engine.input_spec()?;
        spec.validate()?;
        self.input = Some(spec);
        Ok(spec)
    }
}
