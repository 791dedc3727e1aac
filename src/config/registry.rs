//! Model locations and runtime settings for [`crate::registry::ModelRegistry`].

use super::PipelineConfig;
use headswap_core::core::config::{Device, ModelInferenceConfig, OrtSessionConfig};
use headswap_core::core::constants::DEFAULT_SESSION_POOL_SIZE;
use headswap_core::core::{SwapError, SwapResult};
use headswap_core::domain::ModelKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where one model's weights live and how its tensors are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSource {
    /// Path to the `.onnx` weight file.
    pub path: PathBuf,
    /// Input tensor names, bound positionally. Discovered from the model when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_names: Option<Vec<String>>,
    /// Output tensor name. Defaults to the model's first output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
}

impl ModelSource {
    /// A source with discovered tensor names.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            input_names: None,
            output_name: None,
        }
    }

    pub fn with_input_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

/// Everything needed to load the five models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub detector: ModelSource,
    pub geometry: ModelSource,
    pub renderer: ModelSource,
    pub parser: ModelSource,
    pub blender: ModelSource,
    /// Device selection; expanded into execution providers unless
    /// `ort_session` lists them explicitly.
    #[serde(default)]
    pub device: Device,
    /// ONNX Runtime session settings applied to every model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ort_session: Option<OrtSessionConfig>,
    /// Sessions per model; bounds how many requests run one model at once.
    #[serde(default = "default_pool_size")]
    pub session_pool_size: usize,
    /// Stage parameters.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_pool_size() -> usize {
    DEFAULT_SESSION_POOL_SIZE
}

impl RegistryConfig {
    /// Uses the default file names (`detector.onnx`, `geometry.onnx`, ...) inside `dir`.
    pub fn from_model_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let source = |kind: ModelKind| ModelSource::new(dir.join(kind.default_file_name()));
        Self {
            detector: source(ModelKind::Detector),
            geometry: source(ModelKind::Geometry),
            renderer: source(ModelKind::Renderer),
            parser: source(ModelKind::Parser),
            blender: source(ModelKind::Blender),
            device: Device::default(),
            ort_session: None,
            session_pool_size: DEFAULT_SESSION_POOL_SIZE,
            pipeline: PipelineConfig::default(),
        }
    }

    /// Loads a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SwapResult<Self> {
        super::ConfigLoader::load_from_file(path.as_ref())
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = size;
        self
    }

    pub fn with_ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.ort_session = Some(config);
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Replaces the source of one model.
    pub fn with_source(mut self, kind: ModelKind, source: ModelSource) -> Self {
        *self.source_mut(kind) = source;
        self
    }

    /// The source configured for `kind`.
    pub fn source(&self, kind: ModelKind) -> &ModelSource {
        match kind {
            ModelKind::Detector => &self.detector,
            ModelKind::Geometry => &self.geometry,
            ModelKind::Renderer => &self.renderer,
            ModelKind::Parser => &self.parser,
            ModelKind::Blender => &self.blender,
        }
    }

    fn source_mut(&mut self, kind: ModelKind) -> &mut ModelSource {
        match kind {
            ModelKind::Detector => &mut self.detector,
            ModelKind::Geometry => &mut self.geometry,
            ModelKind::Renderer => &mut self.renderer,
            ModelKind::Parser => &mut self.parser,
            ModelKind::Blender => &mut self.blender,
        }
    }

    /// Builds the per-model inference configuration for `kind`.
    ///
    /// Execution providers come from `ort_session` when it lists them and from
    /// `device` otherwise.
    pub fn inference_config(&self, kind: ModelKind) -> ModelInferenceConfig {
        let source = self.source(kind);
        let mut session = self.ort_session.clone().unwrap_or_default();
        if session.execution_providers.is_none() {
            session.execution_providers = Some(self.device.execution_providers());
        }
        ModelInferenceConfig {
            model_name: Some(kind.as_str().to_string()),
            session_pool_size: Some(self.session_pool_size),
            ort_session: Some(session),
            input_names: source.input_names.clone(),
            output_name: source.output_name.clone(),
        }
    }

    /// Validates the configuration without touching the filesystem.
    pub fn validate(&self) -> SwapResult<()> {
        if self.session_pool_size == 0 {
            return Err(SwapError::config_field(
                "session_pool_size",
                self.session_pool_size,
                "must be at least 1",
            ));
        }
        for kind in ModelKind::ALL {
            if self.source(kind).path.as_os_str().is_empty() {
                return Err(SwapError::config_error(format!(
                    "no weight path configured for the {kind} model"
                )));
            }
        }
        self.pipeline.validate()
    }
}
