//! Identifiers for the five models the swap pipeline depends on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The model families loaded by the registry.
///
/// Every pipeline needs exactly one model of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Face detector producing boxes and five landmarks.
    Detector,
    /// 3DMM coefficient regressor.
    Geometry,
    /// Generator that re-renders a face from driving coefficients.
    Renderer,
    /// Face parsing (semantic segmentation) network.
    Parser,
    /// Blending network that fuses the rendered face into the target crop.
    Blender,
}

impl ModelKind {
    /// All model kinds in load order.
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Detector,
        ModelKind::Geometry,
        ModelKind::Renderer,
        ModelKind::Parser,
        ModelKind::Blender,
    ];

    /// Stable lowercase name, also used as the default weight file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Detector => "detector",
            ModelKind::Geometry => "geometry",
            ModelKind::Renderer => "renderer",
            ModelKind::Parser => "parser",
            ModelKind::Blender => "blender",
        }
    }

    /// Default weight file name inside a model directory.
    pub fn default_file_name(&self) -> String {
        format!("{}.onnx", self.as_str())
    }

    /// Position of this kind inside [`ModelKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            ModelKind::Detector => 0,
            ModelKind::Geometry => 1,
            ModelKind::Renderer => 2,
            ModelKind::Parser => 3,
            ModelKind::Blender => 4,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
