//! Python bindings for the sightline post-processing library.
//!
//! Inference stays in Python (onnxruntime, tflite, ...); these bindings take
//! the raw output array and return labeled detections.

use std::collections::HashMap;

use numpy::{PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use sightline::{
    CoordinateMode, Detection as RustDetection, FrameGeometry, GeometryLimits, InputSpec, Labels,
    PipelineConfig as RustPipelineConfig, Postprocessor as RustPostprocessor, RawDetectionTensor,
    ScoreActivation, SightlineError, SuppressionMode, Thresholds as RustThresholds,
    DEFAULT_MAX_RESULTS,
};

/// Convert a SightlineError to a Python exception.
fn to_py_err(err: SightlineError) -> PyErr {
    match err {
        SightlineError::InvalidThreshold { .. } | SightlineError::InvalidConfig(_) => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn parse_coordinate_mode(value: &str) -> PyResult<CoordinateMode> {
    match value.to_lowercase().as_str() {
        "auto" => Ok(CoordinateMode::Auto),
        "normalized" => Ok(CoordinateMode::Normalized),
        "pixels" => Ok(CoordinateMode::Pixels),
        _ => Err(PyValueError::new_err(
            "coordinate_mode must be 'auto', 'normalized' or 'pixels'",
        )),
    }
}

fn parse_activation(value: &str) -> PyResult<ScoreActivation> {
    match value.to_lowercase().as_str() {
        "identity" => Ok(ScoreActivation::Identity),
        "sigmoid" => Ok(ScoreActivation::Sigmoid),
        _ => Err(PyValueError::new_err(
            "activation must be 'identity' or 'sigmoid'",
        )),
    }
}

fn parse_suppression(value: &str) -> PyResult<SuppressionMode> {
    match value.to_lowercase().as_str() {
        "class_agnostic" => Ok(SuppressionMode::ClassAgnostic),
        "per_class" => Ok(SuppressionMode::PerClass),
        _ => Err(PyValueError::new_err(
            "suppression must be 'class_agnostic' or 'per_class'",
        )),
    }
}

/// A labeled object with its box normalized to the source frame.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    /// Class label.
    #[pyo3(get)]
    pub label: String,
    /// Class id.
    #[pyo3(get)]
    pub class_id: usize,
    /// Confidence in [0, 1].
    #[pyo3(get)]
    pub confidence: f32,
    /// Left edge as a fraction of the frame width.
    #[pyo3(get)]
    pub left: f32,
    /// Top edge as a fraction of the frame height.
    #[pyo3(get)]
    pub top: f32,
    /// Right edge as a fraction of the frame width.
    #[pyo3(get)]
    pub right: f32,
    /// Bottom edge as a fraction of the frame height.
    #[pyo3(get)]
    pub bottom: f32,
    /// Label of the second most likely class, if any.
    #[pyo3(get)]
    pub runner_up_label: Option<String>,
    /// Confidence of the second most likely class, if any.
    #[pyo3(get)]
    pub runner_up_confidence: Option<f32>,
}

#[pymethods]
impl Detection {
    /// Box as a (left, top, right, bottom) tuple.
    #[getter]
    fn bbox(&self) -> (f32, f32, f32, f32) {
        (self.left, self.top, self.right, self.bottom)
    }

    fn __repr__(&self) -> String {
        format!(
            "Detection(label='{}', confidence={:.3}, bbox=({:.3}, {:.3}, {:.3}, {:.3}))",
            self.label, self.confidence, self.left, self.top, self.right, self.bottom
        )
    }
}

impl From<RustDetection> for Detection {
    fn from(d: RustDetection) -> Self {
        let (runner_up_label, runner_up_confidence) = match d.runner_up {
            Some(r) => (Some(r.label), Some(r.confidence)),
            None => (None, None),
        };
        Self {
            label: d.label,
            class_id: d.class_id,
            confidence: d.confidence,
            left: d.bbox.left,
            top: d.bbox.top,
            right: d.bbox.right,
            bottom: d.bbox.bottom,
            runner_up_label,
            runner_up_confidence,
        }
    }
}

/// Frame-independent pipeline settings.
#[pyclass]
#[derive(Clone)]
pub struct PipelineConfig {
    inner: RustPipelineConfig,
}

#[pymethods]
impl PipelineConfig {
    /// Create a new PipelineConfig.
    ///
    /// Args:
    ///     iou_threshold: Overlap at which the weaker box is dropped (default: 0.45)
    ///     min_box_px: Minimum box width and height in frame pixels (default: 30.0)
    ///     max_aspect_ratio: Maximum box elongation (default: 8.0)
    ///     coordinate_mode: "auto", "normalized" or "pixels" (default: "auto")
    ///     activation: "identity" or "sigmoid" (default: "identity")
    ///     suppression: "class_agnostic" or "per_class" (default: "class_agnostic")
    ///     parallel: Decode anchors on all cores (default: False)
    #[new]
    #[pyo3(signature = (
        iou_threshold = 0.45,
        min_box_px = 30.0,
        max_aspect_ratio = 8.0,
        coordinate_mode = "auto",
        activation = "identity",
        suppression = "class_agnostic",
        parallel = false
    ))]
    fn new(
        iou_threshold: f32,
        min_box_px: f32,
        max_aspect_ratio: f32,
        coordinate_mode: &str,
        activation: &str,
        suppression: &str,
        parallel: bool,
    ) -> PyResult<Self> {
        let inner = RustPipelineConfig {
            iou_threshold,
            geometry: GeometryLimits {
                min_box_px,
                max_aspect_ratio,
            },
            coordinate_mode: parse_coordinate_mode(coordinate_mode)?,
            activation: parse_activation(activation)?,
            suppression: parse_suppression(suppression)?,
            parallel,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!(
            "PipelineConfig(iou_threshold={}, min_box_px={}, max_aspect_ratio={}, parallel={})",
            self.inner.iou_threshold,
            self.inner.geometry.min_box_px,
            self.inner.geometry.max_aspect_ratio,
            self.inner.parallel
        )
    }
}

/// Confidence thresholds with per-class overrides.
#[pyclass]
#[derive(Clone)]
pub struct Thresholds {
    inner: RustThresholds,
}

#[pymethods]
impl Thresholds {
    /// Create thresholds.
    ///
    /// Args:
    ///     global_threshold: Cutoff for classes without an override (default: 0.25)
    ///     overrides: Mapping from class label to cutoff (default: None)
    #[new]
    #[pyo3(signature = (global_threshold = 0.25, overrides = None))]
    fn new(global_threshold: f32, overrides: Option<HashMap<String, f32>>) -> PyResult<Self> {
        let inner = RustThresholds::with_overrides(global_threshold, overrides.unwrap_or_default())
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Global cutoff.
    #[getter]
    fn global_threshold(&self) -> f32 {
        self.inner.global()
    }

    /// Effective cutoff for a class label.
    fn effective(&self, label: &str) -> f32 {
        self.inner.effective(Some(label))
    }

    fn __repr__(&self) -> String {
        let overrides: Vec<String> = self
            .inner
            .overrides()
            .map(|(name, value)| format!("'{name}': {value}"))
            .collect();
        format!(
            "Thresholds(global_threshold={}, overrides={{{}}})",
            self.inner.global(),
            overrides.join(", ")
        )
    }
}

/// Decodes, filters and de-duplicates raw detector output.
#[pyclass]
pub struct Postprocessor {
    inner: RustPostprocessor<Labels>,
}

impl Postprocessor {
    fn from_labels(labels: Labels, config: Option<PipelineConfig>) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let inner = RustPostprocessor::new(labels, cfg).map_err(to_py_err)?;
        Ok(Self { inner })
    }
}

#[pymethods]
impl Postprocessor {
    /// Create a postprocessor.
    ///
    /// Args:
    ///     labels: Class names in class-id order
    ///     config: PipelineConfig (default: PipelineConfig())
    #[new]
    #[pyo3(signature = (labels, config = None))]
    fn new(labels: Vec<String>, config: Option<PipelineConfig>) -> PyResult<Self> {
        Self::from_labels(Labels::new(labels), config)
    }

    /// Create a postprocessor from a label file with one name per line.
    #[staticmethod]
    #[pyo3(signature = (path, config = None))]
    fn from_file(path: &str, config: Option<PipelineConfig>) -> PyResult<Self> {
        let labels = Labels::load(path).map_err(to_py_err)?;
        Self::from_labels(labels, config)
    }

    /// Number of known labels.
    #[getter]
    fn num_labels(&self) -> usize {
        self.inner.labels().names().len()
    }

    /// Run the pipeline on one output array.
    ///
    /// Args:
    ///     output: float32 array shaped [1, C, A], [C, A] or [A, C]
    ///     image_width: Source frame width in pixels
    ///     image_height: Source frame height in pixels
    ///     input_width: Model input width (default: 640)
    ///     input_height: Model input height (default: 640)
    ///     thresholds: Thresholds (default: Thresholds())
    ///     max_results: Maximum detections returned (default: 5)
    ///
    /// Returns:
    ///     List of Detection objects, most confident first
    #[pyo3(signature = (
        output,
        image_width,
        image_height,
        input_width = 640,
        input_height = 640,
        thresholds = None,
        max_results = DEFAULT_MAX_RESULTS
    ))]
    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        output: PyReadonlyArrayDyn<'_, f32>,
        image_width: usize,
        image_height: usize,
        input_width: usize,
        input_height: usize,
        thresholds: Option<Thresholds>,
        max_results: usize,
    ) -> PyResult<Vec<Detection>> {
        let shape = output.shape().to_vec();
        let data = output.as_slice()?;
        let tensor = RawDetectionTensor::from_shape(data, &shape, self.inner.expected_classes())
            .map_err(to_py_err)?;

        let spec = InputSpec {
            width: input_width,
            height: input_height,
            ..InputSpec::square_f32(input_width)
        };
        let geometry = FrameGeometry::new(&spec, image_width, image_height);
        let thresholds = thresholds.map(|t| t.inner).unwrap_or_default();

        let detections = self
            .inner
            .run(&tensor, geometry, &thresholds, max_results)
            .map_err(to_py_err)?;
        Ok(detections.into_iter().map(Detection::from).collect())
    }

    fn __repr__(&self) -> String {
        format!(
            "Postprocessor(num_labels={}, iou_threshold={})",
            self.num_labels(),
            self.inner.config().iou_threshold
        )
    }
}

/// Convenience function running the default pipeline on one output array.
///
/// For repeated frames create a Postprocessor once and call run().
///
/// Args:
///     output: float32 array shaped [1, C, A], [C, A] or [A, C]
///     labels: Class names in class-id order
///     image_width: Source frame width in pixels
///     image_height: Source frame height in pixels
///     input_size: Square model input size (default: 640)
///     confidence: Global confidence cutoff (default: 0.25)
///     max_results: Maximum detections returned (default: 5)
///
/// Returns:
///     List of Detection objects, most confident first
#[pyfunction]
#[pyo3(signature = (
    output,
    labels,
    image_width,
    image_height,
    input_size = 640,
    confidence = 0.25,
    max_results = DEFAULT_MAX_RESULTS
))]
fn detect(
    output: PyReadonlyArrayDyn<'_, f32>,
    labels: Vec<String>,
    image_width: usize,
    image_height: usize,
    input_size: usize,
    confidence: f32,
    max_results: usize,
) -> PyResult<Vec<Detection>> {
    let post = Postprocessor::from_labels(Labels::new(labels), None)?;
    let thresholds = Thresholds {
        inner: RustThresholds::new(confidence).map_err(to_py_err)?,
    };
    post.run(
        output,
        image_width,
        image_height,
        input_size,
        input_size,
        Some(thresholds),
        max_results,
    )
}

/// Python module for sightline detection post-processing.
#[pymodule]
fn _sightline(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<PipelineConfig>()?;
    m.add_class::<Thresholds>()?;
    m.add_class::<Postprocessor>()?;
    m.add_function(wrap_pyfunction!(detect, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
