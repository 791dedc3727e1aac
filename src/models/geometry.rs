//! 3DMM coefficient estimation.

use crate::config::PipelineConfig;
use crate::registry::ModelHandle;
use headswap_core::core::{SwapError, SwapResult, TensorInput};
use headswap_core::domain::{AlignedFace, GeometryParameters, ParameterLayout};
use headswap_core::utils::{PixelRange, image_to_tensor, resize};
use tracing::{debug, warn};

/// Regresses the coefficient vector of an aligned face.
///
/// Input `[1, 3, G, G]` RGB in `[0, 1]`, output `[1, L]`. Stateless; identical
/// inputs produce identical vectors.
#[derive(Debug, Clone)]
pub struct GeometryEstimator {
    handle: ModelHandle,
    input_size: u32,
    layout: ParameterLayout,
}

impl GeometryEstimator {
    pub fn new(handle: ModelHandle, config: &PipelineConfig) -> Self {
        Self {
            handle,
            input_size: config.geometry_input_size,
            layout: config.parameter_layout.clone(),
        }
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    /// Estimates the coefficients of `face`.
    ///
    /// # Errors
    ///
    /// [`SwapError::GeometryError`] when the model returns a vector of the
    /// wrong length or with non-finite values. Model failures propagate as
    /// [`SwapError::ModelExecution`].
    pub fn estimate(&self, face: &AlignedFace) -> SwapResult<GeometryParameters> {
        let crop = face.image();
        let input = if crop.width() == self.input_size {
            crop.clone()
        } else {
            resize(crop, self.input_size, self.input_size)
        };
        let tensor = image_to_tensor(&input, PixelRange::Unit);
        let output = self.handle.infer(&[TensorInput::new("image", tensor.view())])?;

        let result = if output.ndim() != 2 || output.shape()[0] != 1 {
            Err(SwapError::geometry(format!(
                "expected a [1, {}] vector, got shape {:?}",
                self.layout.len(),
                output.shape()
            )))
        } else {
            GeometryParameters::new(output.iter().copied().collect(), self.layout.clone())
        };

        match &result {
            Ok(params) => debug!(coefficients = params.len(), "geometry estimated"),
            Err(err) => warn!(
                crop_size = face.size(),
                mean_intensity = crop.mean_intensity(),
                output_shape = ?output.shape(),
                error = %err,
                "geometry estimation rejected model output"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeGeometry, aligned_face, small_config};
    use headswap_core::domain::ModelKind;
    use std::sync::Arc;

    fn estimator(fake: FakeGeometry) -> (GeometryEstimator, Arc<FakeGeometry>) {
        let fake = Arc::new(fake);
        let handle = ModelHandle::new(ModelKind::Geometry, fake.clone());
        (GeometryEstimator::new(handle, &small_config()), fake)
    }

    #[test]
    fn test_estimation_is_bit_identical() {
        let (estimator, fake) = estimator(FakeGeometry::new(small_config().parameter_layout.len()));
        let face = aligned_face([200, 180, 160]);
        let a = estimator.estimate(&face).unwrap();
        let b = estimator.estimate(&face).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(a.len(), 257);
        assert_eq!(fake.calls(), 2);
    }

    #[test]
    fn test_nan_output_is_geometry_error() {
        let (estimator, _) = estimator(FakeGeometry::with_nan_at(257, 3));
        let err = estimator.estimate(&aligned_face([10, 10, 10])).unwrap_err();
        assert_eq!(err.code(), "geometry_error");
    }

    #[test]
    fn test_wrong_length_is_geometry_error() {
        let (estimator, _) = estimator(FakeGeometry::new(100));
        let err = estimator.estimate(&aligned_face([10, 10, 10])).unwrap_err();
        assert_eq!(err.code(), "geometry_error");
    }
}
