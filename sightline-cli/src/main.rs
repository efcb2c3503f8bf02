use clap::Parser;
use serde::{Deserialize, Serialize};
use sightline::image::io::load_rgb_frame;
use sightline::{
    CoordinateMode, Detection, FrameGeometry, GeometryLimits, InputSpec, Labels, OutputTensor,
    PipelineConfig, Postprocessor, ScoreActivation, SuppressionMode, Thresholds,
    DEFAULT_MAX_RESULTS,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Sightline CLI: decode a saved detector output (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for per-stage timing.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CoordinateModeConfig {
    Auto,
    Normalized,
    Pixels,
}

impl From<CoordinateModeConfig> for CoordinateMode {
    fn from(value: CoordinateModeConfig) -> Self {
        match value {
            CoordinateModeConfig::Auto => CoordinateMode::Auto,
            CoordinateModeConfig::Normalized => CoordinateMode::Normalized,
            CoordinateModeConfig::Pixels => CoordinateMode::Pixels,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ActivationConfig {
    Identity,
    Sigmoid,
}

impl From<ActivationConfig> for ScoreActivation {
    fn from(value: ActivationConfig) -> Self {
        match value {
            ActivationConfig::Identity => ScoreActivation::Identity,
            ActivationConfig::Sigmoid => ScoreActivation::Sigmoid,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SuppressionConfig {
    ClassAgnostic,
    PerClass,
}

impl From<SuppressionConfig> for SuppressionMode {
    fn from(value: SuppressionConfig) -> Self {
        match value {
            SuppressionConfig::ClassAgnostic => SuppressionMode::ClassAgnostic,
            SuppressionConfig::PerClass => SuppressionMode::PerClass,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ThresholdsJson {
    global: f32,
    overrides: BTreeMap<String, f32>,
}

impl Default for ThresholdsJson {
    fn default() -> Self {
        Self {
            global: Thresholds::default().global(),
            overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PipelineConfigJson {
    iou_threshold: f32,
    min_box_px: f32,
    max_aspect_ratio: f32,
    coordinate_mode: CoordinateModeConfig,
    activation: ActivationConfig,
    suppression: SuppressionConfig,
    parallel: bool,
}

impl Default for PipelineConfigJson {
    fn default() -> Self {
        let cfg = PipelineConfig::default();
        Self {
            iou_threshold: cfg.iou_threshold,
            min_box_px: cfg.geometry.min_box_px,
            max_aspect_ratio: cfg.geometry.max_aspect_ratio,
            coordinate_mode: CoordinateModeConfig::Auto,
            activation: ActivationConfig::Identity,
            suppression: SuppressionConfig::ClassAgnostic,
            parallel: cfg.parallel,
        }
    }
}

impl From<PipelineConfigJson> for PipelineConfig {
    fn from(value: PipelineConfigJson) -> Self {
        Self {
            iou_threshold: value.iou_threshold,
            geometry: GeometryLimits {
                min_box_px: value.min_box_px,
                max_aspect_ratio: value.max_aspect_ratio,
            },
            coordinate_mode: value.coordinate_mode.into(),
            activation: value.activation.into(),
            suppression: value.suppression.into(),
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    tensor_path: String,
    labels_path: Option<String>,
    image_path: Option<String>,
    image_width: usize,
    image_height: usize,
    input_width: usize,
    input_height: usize,
    max_results: usize,
    output_path: Option<String>,
    thresholds: ThresholdsJson,
    pipeline: PipelineConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tensor_path: String::new(),
            labels_path: None,
            image_path: None,
            image_width: 640,
            image_height: 640,
            input_width: 640,
            input_height: 640,
            max_results: DEFAULT_MAX_RESULTS,
            output_path: None,
            thresholds: ThresholdsJson::default(),
            pipeline: PipelineConfigJson::default(),
        }
    }
}

/// Saved engine output: `{ "shape": [1, 84, 8400], "data": [...] }`.
#[derive(Debug, Deserialize)]
struct TensorFile {
    shape: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct BoxRecord {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

#[derive(Debug, Serialize)]
struct RunnerUpRecord {
    label: String,
    class_id: usize,
    confidence: f32,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    label: String,
    class_id: usize,
    confidence: f32,
    bbox: BoxRecord,
    runner_up: Option<RunnerUpRecord>,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            label: value.label,
            class_id: value.class_id,
            confidence: value.confidence,
            bbox: BoxRecord {
                left: value.bbox.left,
                top: value.bbox.top,
                right: value.bbox.right,
                bottom: value.bbox.bottom,
            },
            runner_up: value.runner_up.map(|r| RunnerUpRecord {
                label: r.label,
                class_id: r.class_id,
                confidence: r.confidence,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    image_width: usize,
    image_height: usize,
    detections: Vec<DetectionRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("sightline=debug".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.tensor_path.is_empty() {
        return Err("tensor_path must be set in the config".into());
    }

    let labels = match &config.labels_path {
        Some(path) => Labels::load(path)?,
        None => Labels::default(),
    };
    let thresholds =
        Thresholds::with_overrides(config.thresholds.global, config.thresholds.overrides)?;

    // The frame is only needed for its size; the tensor was produced elsewhere.
    let (image_width, image_height) = match &config.image_path {
        Some(path) => {
            let frame = load_rgb_frame(path)?;
            (frame.width(), frame.height())
        }
        None => (config.image_width, config.image_height),
    };

    let tensor_text = fs::read_to_string(&config.tensor_path)?;
    let tensor_file: TensorFile = serde_json::from_str(&tensor_text)?;
    let output = OutputTensor::new(tensor_file.shape, tensor_file.data);

    let post = Postprocessor::new(labels, config.pipeline.into())?;
    let geometry = FrameGeometry::new(
        &InputSpec {
            width: config.input_width,
            height: config.input_height,
            ..InputSpec::square_f32(config.input_width)
        },
        image_width,
        image_height,
    );
    let detections = post.run_output(&output, geometry, &thresholds, config.max_results)?;
    tracing::info!(count = detections.len(), "detections");

    let output = Output {
        image_width,
        image_height,
        detections: detections.into_iter().map(DetectionRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
