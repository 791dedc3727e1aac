//! 3DMM coefficient vectors and their named sub-ranges.

use crate::core::errors::{SwapError, SwapResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Named sub-ranges of a coefficient vector.
///
/// The default is the 257-coefficient Basel Face Model layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterLayout {
    pub identity: Range<usize>,
    pub expression: Range<usize>,
    pub texture: Range<usize>,
    pub angles: Range<usize>,
    pub lighting: Range<usize>,
    pub translation: Range<usize>,
}

impl Default for ParameterLayout {
    fn default() -> Self {
        Self {
            identity: 0..80,
            expression: 80..144,
            texture: 144..224,
            angles: 224..227,
            lighting: 227..254,
            translation: 254..257,
        }
    }
}

impl ParameterLayout {
    /// Total vector length covered by the layout.
    pub fn len(&self) -> usize {
        self.ranges()
            .iter()
            .map(|r| r.end)
            .max()
            .unwrap_or(0)
    }

    /// True when the layout covers no coefficients.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ranges(&self) -> [&Range<usize>; 6] {
        [
            &self.identity,
            &self.expression,
            &self.texture,
            &self.angles,
            &self.lighting,
            &self.translation,
        ]
    }

    /// Checks that the sub-ranges are non-empty, disjoint and tile `0..len()`.
    pub fn validate(&self) -> SwapResult<()> {
        let mut ranges: Vec<&Range<usize>> = self.ranges().to_vec();
        ranges.sort_by_key(|r| r.start);
        let mut cursor = 0;
        for range in ranges {
            if range.is_empty() || range.start != cursor {
                return Err(SwapError::config_error(format!(
                    "parameter layout must tile the vector without gaps or overlaps (range {range:?} at offset {cursor})"
                )));
            }
            cursor = range.end;
        }
        Ok(())
    }
}

/// A validated coefficient vector for one face.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryParameters {
    values: Vec<f32>,
    layout: ParameterLayout,
}

impl GeometryParameters {
    /// Wraps a raw vector.
    ///
    /// Fails with [`SwapError::GeometryError`] when the length does not match
    /// the layout or a value is not finite. No partial vectors are accepted.
    pub fn new(values: Vec<f32>, layout: ParameterLayout) -> SwapResult<Self> {
        if values.len() != layout.len() {
            return Err(SwapError::geometry(format!(
                "expected {} coefficients, got {}",
                layout.len(),
                values.len()
            )));
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(SwapError::geometry(format!(
                "non-finite coefficient {} at index {idx}",
                values[idx]
            )));
        }
        Ok(Self { values, layout })
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn identity(&self) -> &[f32] {
        &self.values[self.layout.identity.clone()]
    }

    pub fn expression(&self) -> &[f32] {
        &self.values[self.layout.expression.clone()]
    }

    pub fn texture(&self) -> &[f32] {
        &self.values[self.layout.texture.clone()]
    }

    /// Rotation angles (pitch, yaw, roll).
    pub fn angles(&self) -> &[f32] {
        &self.values[self.layout.angles.clone()]
    }

    /// Spherical-harmonics lighting coefficients.
    pub fn lighting(&self) -> &[f32] {
        &self.values[self.layout.lighting.clone()]
    }

    pub fn translation(&self) -> &[f32] {
        &self.values[self.layout.translation.clone()]
    }

    /// Pose as rotation angles followed by translation.
    pub fn pose(&self) -> Vec<f32> {
        let mut pose = self.angles().to_vec();
        pose.extend_from_slice(self.translation());
        pose
    }

    /// Full vector, for serialization into a model input.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}
