//! Stage parameters shared by the registry canaries and the pipeline.

use headswap_core::core::constants::{
    DEFAULT_CANONICAL_SIZE, DEFAULT_DETECTOR_INPUT_SIZE, DEFAULT_FEATHER_PX,
    DEFAULT_GEOMETRY_INPUT_SIZE, DEFAULT_NMS_IOU_THRESHOLD, DEFAULT_SCORE_THRESHOLD,
};
use headswap_core::core::validation::{validate_positive, validate_range};
use headswap_core::core::{SwapError, SwapResult};
use headswap_core::domain::ParameterLayout;
use serde::{Deserialize, Serialize};

/// Blending options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// Whether hair (and hats) belong to the editable head region.
    pub include_hair: bool,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self { include_hair: true }
    }
}

/// Tensor sizes and thresholds used by every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Side length of aligned crops and of renderer/parser/blender tensors.
    pub canonical_size: u32,
    /// Side length of the letterboxed detector input.
    pub detector_input_size: u32,
    /// Side length of the geometry regressor input.
    pub geometry_input_size: u32,
    /// Minimum detection score.
    pub score_threshold: f32,
    /// IoU threshold for non-maximum suppression.
    pub nms_iou_threshold: f32,
    /// Width of the alpha ramp used when pasting the crop into the frame.
    pub feather_px: u32,
    /// Blending options.
    pub blend: BlendConfig,
    /// Layout of the geometry coefficient vector.
    pub parameter_layout: ParameterLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canonical_size: DEFAULT_CANONICAL_SIZE,
            detector_input_size: DEFAULT_DETECTOR_INPUT_SIZE,
            geometry_input_size: DEFAULT_GEOMETRY_INPUT_SIZE,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            nms_iou_threshold: DEFAULT_NMS_IOU_THRESHOLD,
            feather_px: DEFAULT_FEATHER_PX,
            blend: BlendConfig::default(),
            parameter_layout: ParameterLayout::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canonical_size(mut self, size: u32) -> Self {
        self.canonical_size = size;
        self
    }

    pub fn with_detector_input_size(mut self, size: u32) -> Self {
        self.detector_input_size = size;
        self
    }

    pub fn with_geometry_input_size(mut self, size: u32) -> Self {
        self.geometry_input_size = size;
        self
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn with_nms_iou_threshold(mut self, threshold: f32) -> Self {
        self.nms_iou_threshold = threshold;
        self
    }

    pub fn with_feather_px(mut self, feather_px: u32) -> Self {
        self.feather_px = feather_px;
        self
    }

    /// Excludes hair from the editable region when `include` is false.
    pub fn with_hair(mut self, include: bool) -> Self {
        self.blend.include_hair = include;
        self
    }

    pub fn with_parameter_layout(mut self, layout: ParameterLayout) -> Self {
        self.parameter_layout = layout;
        self
    }

    /// Validates the configuration parameters.
    ///
    /// Every failure is reported as [`SwapError::Config`].
    pub fn validate(&self) -> SwapResult<()> {
        let as_config = |e: SwapError| SwapError::config_error(e.to_string());
        validate_positive(self.canonical_size, "canonical_size").map_err(as_config)?;
        validate_positive(self.detector_input_size, "detector_input_size").map_err(as_config)?;
        validate_positive(self.geometry_input_size, "geometry_input_size").map_err(as_config)?;
        validate_range(self.score_threshold, 0.0, 1.0, "score_threshold").map_err(as_config)?;
        validate_range(self.nms_iou_threshold, 0.0, 1.0, "nms_iou_threshold").map_err(as_config)?;
        if self.feather_px.saturating_mul(2) >= self.canonical_size {
            return Err(SwapError::config_field(
                "feather_px",
                self.feather_px,
                "must be smaller than half the canonical size",
            ));
        }
        self.parameter_layout.validate()
    }
}
