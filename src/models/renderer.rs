//! Re-rendering a face with source identity on target geometry.

use crate::config::PipelineConfig;
use crate::registry::ModelHandle;
use headswap_core::core::validation::validate_output_shape;
use headswap_core::core::{SwapError, SwapResult, TensorInput};
use headswap_core::domain::{GeometryParameters, RawImage};
use headswap_core::utils::tensor::as_nchw;
use headswap_core::utils::{PixelRange, tensor_to_image};
use ndarray::Array2;
use tracing::debug;

/// Builds the driving vector: identity and texture from `source`, expression,
/// pose and lighting from `target`.
///
/// # Errors
///
/// Returns [`SwapError::GeometryError`] when the two vectors use different
/// layouts.
pub fn compose_driving_parameters(
    source: &GeometryParameters,
    target: &GeometryParameters,
) -> SwapResult<GeometryParameters> {
    if source.layout() != target.layout() {
        return Err(SwapError::geometry(
            "source and target coefficients use different layouts",
        ));
    }
    let layout = target.layout().clone();
    let mut values = target.as_slice().to_vec();
    values[layout.identity.clone()].copy_from_slice(source.identity());
    values[layout.texture.clone()].copy_from_slice(source.texture());
    GeometryParameters::new(values, layout)
}

/// Synthesises the canonical crop for a driving vector.
///
/// Input `[1, L]`, output `[1, 3, C, C]` in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct Renderer {
    handle: ModelHandle,
    canonical_size: u32,
}

impl Renderer {
    pub fn new(handle: ModelHandle, config: &PipelineConfig) -> Self {
        Self {
            handle,
            canonical_size: config.canonical_size,
        }
    }

    /// Renders the source identity with the target's expression, pose and
    /// lighting.
    pub fn render(
        &self,
        source: &GeometryParameters,
        target: &GeometryParameters,
    ) -> SwapResult<RawImage> {
        let driving = compose_driving_parameters(source, target)?;
        let coeffs = Array2::from_shape_vec((1, driving.len()), driving.as_slice().to_vec())?;
        let output = self.handle.infer(&[TensorInput::new("coeffs", coeffs.view())])?;

        let c = Some(self.canonical_size as usize);
        validate_output_shape(self.handle.name(), output.shape(), &[Some(1), Some(3), c, c])?;
        let image = tensor_to_image(as_nchw(&output, "renderer output")?, PixelRange::Signed)?;
        debug!(size = image.width(), "face rendered");
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeRenderer, small_config};
    use headswap_core::domain::{ModelKind, ParameterLayout};
    use std::sync::Arc;

    fn params(fill: impl Fn(usize) -> f32) -> GeometryParameters {
        let layout = ParameterLayout::default();
        GeometryParameters::new((0..layout.len()).map(fill).collect(), layout).unwrap()
    }

    #[test]
    fn test_substitution_rule() {
        let source = params(|i| i as f32);
        let target = params(|i| -(i as f32));
        let driving = compose_driving_parameters(&source, &target).unwrap();

        assert_eq!(driving.identity(), source.identity());
        assert_eq!(driving.texture(), source.texture());
        assert_eq!(driving.expression(), target.expression());
        assert_eq!(driving.angles(), target.angles());
        assert_eq!(driving.translation(), target.translation());
        assert_eq!(driving.lighting(), target.lighting());
    }

    #[test]
    fn test_render_output_is_canonical() {
        let config = small_config();
        let fake = Arc::new(FakeRenderer::new(config.canonical_size));
        let renderer = Renderer::new(ModelHandle::new(ModelKind::Renderer, fake.clone()), &config);
        let image = renderer
            .render(&params(|_| 0.5), &params(|_| 0.1))
            .unwrap();
        assert_eq!(image.dimensions(), (config.canonical_size, config.canonical_size));
        assert_eq!(fake.calls(), 1);
    }

    #[test]
    fn test_wrong_output_size_is_model_execution_error() {
        let config = small_config();
        let fake = Arc::new(FakeRenderer::new(config.canonical_size / 2));
        let renderer = Renderer::new(ModelHandle::new(ModelKind::Renderer, fake), &config);
        let err = renderer
            .render(&params(|_| 0.5), &params(|_| 0.1))
            .unwrap_err();
        assert_eq!(err.code(), "model_execution_error");
    }
}
