//! Invertible frame-to-crop affine transform.

use crate::core::constants::DEGENERATE_DETERMINANT_EPSILON;
use crate::core::errors::{SwapError, SwapResult};
use nalgebra::Matrix3;

/// Affine mapping from frame coordinates to canonical crop coordinates.
///
/// Both directions are stored as homogeneous 3x3 matrices with `[0, 0, 1]` as
/// the last row. A value of this type always has a valid inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentTransform {
    forward: Matrix3<f32>,
    inverse: Matrix3<f32>,
}

impl AlignmentTransform {
    /// Builds a transform from the 2x3 affine `[[a, b, tx], [c, d, ty]]`.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::InvalidInput`] when a coefficient is not finite or
    /// the linear part is degenerate.
    pub fn from_affine(affine: [[f32; 3]; 2]) -> SwapResult<Self> {
        if affine.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SwapError::invalid_input(format!(
                "alignment transform has non-finite coefficients: {affine:?}"
            )));
        }
        let forward = Matrix3::new(
            affine[0][0],
            affine[0][1],
            affine[0][2],
            affine[1][0],
            affine[1][1],
            affine[1][2],
            0.0,
            0.0,
            1.0,
        );
        let det = forward.determinant();
        if det.abs() <= DEGENERATE_DETERMINANT_EPSILON {
            return Err(SwapError::invalid_input(format!(
                "alignment transform is degenerate (determinant {det})"
            )));
        }
        let inverse = forward.try_inverse().ok_or_else(|| {
            SwapError::invalid_input("alignment transform is not invertible")
        })?;
        Ok(Self { forward, inverse })
    }

    /// The identity mapping, used when the input is already a canonical crop.
    pub fn identity() -> Self {
        Self {
            forward: Matrix3::identity(),
            inverse: Matrix3::identity(),
        }
    }

    /// Frame -> crop matrix.
    pub fn forward(&self) -> &Matrix3<f32> {
        &self.forward
    }

    /// Crop -> frame matrix.
    pub fn inverse(&self) -> &Matrix3<f32> {
        &self.inverse
    }

    /// Forward transform as a 2x3 affine.
    pub fn as_affine(&self) -> [[f32; 3]; 2] {
        let m = &self.forward;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        ]
    }

    /// Maps a frame point into crop coordinates.
    pub fn to_crop(&self, x: f32, y: f32) -> (f32, f32) {
        apply(&self.forward, x, y)
    }

    /// Maps a crop point back into frame coordinates.
    pub fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        apply(&self.inverse, x, y)
    }

    /// Uniform scale factor of the forward mapping.
    pub fn scale(&self) -> f32 {
        let m = &self.forward;
        (m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]).abs().sqrt()
    }

    /// Largest absolute difference between the two forward matrices.
    pub fn max_deviation(&self, other: &AlignmentTransform) -> f32 {
        (self.forward - other.forward).abs().max()
    }
}

fn apply(m: &Matrix3<f32>, x: f32, y: f32) -> (f32, f32) {
    (
        m[(0, 0)] * x + m[(0, 1)] * y + m[(0, 2)],
        m[(1, 0)] * x + m[(1, 1)] * y + m[(1, 2)],
    )
}
