//! Startup canary inferences.
//!
//! Each model is run once on zero tensors of its expected input shapes and the
//! output shape is checked against the stage contract. A model that fails here
//! would fail every request, so the registry refuses to start instead.

use super::ModelHandle;
use crate::config::PipelineConfig;
use headswap_core::core::constants::{DETECTION_ROW_LEN, NUM_PARSING_CLASSES};
use headswap_core::core::validation::validate_output_shape;
use headswap_core::core::{SwapError, SwapResult, TensorInput};
use headswap_core::domain::ModelKind;
use ndarray::{ArrayD, IxDyn};

/// Named input shapes a model of `kind` is fed.
pub(crate) fn input_shapes(kind: ModelKind, config: &PipelineConfig) -> Vec<(&'static str, Vec<usize>)> {
    let c = config.canonical_size as usize;
    match kind {
        ModelKind::Detector => {
            let s = config.detector_input_size as usize;
            vec![("image", vec![1, 3, s, s])]
        }
        ModelKind::Geometry => {
            let g = config.geometry_input_size as usize;
            vec![("image", vec![1, 3, g, g])]
        }
        ModelKind::Renderer => vec![("coeffs", vec![1, config.parameter_layout.len()])],
        ModelKind::Parser => vec![("image", vec![1, 3, c, c])],
        ModelKind::Blender => vec![
            ("rendered", vec![1, 3, c, c]),
            ("target", vec![1, 3, c, c]),
            ("rendered_mask", vec![1, 1, c, c]),
            ("target_mask", vec![1, 1, c, c]),
        ],
    }
}

/// Checks an output shape against the contract for `kind`.
pub(crate) fn check_output(kind: ModelKind, config: &PipelineConfig, shape: &[usize]) -> SwapResult<()> {
    let c = Some(config.canonical_size as usize);
    let name = kind.as_str();
    match kind {
        ModelKind::Detector => {
            validate_output_shape(name, shape, &[Some(1), None, Some(DETECTION_ROW_LEN)])
        }
        ModelKind::Geometry => validate_output_shape(
            name,
            shape,
            &[Some(1), Some(config.parameter_layout.len())],
        ),
        ModelKind::Renderer | ModelKind::Blender => {
            validate_output_shape(name, shape, &[Some(1), Some(3), c, c])
        }
        ModelKind::Parser => {
            validate_output_shape(name, shape, &[Some(1), None, c, c])?;
            if shape[1] < NUM_PARSING_CLASSES {
                return Err(SwapError::output_contract(
                    name,
                    &format!("at least {NUM_PARSING_CLASSES} class channels"),
                    shape,
                ));
            }
            Ok(())
        }
    }
}

/// Runs the canary for one handle.
pub(crate) fn run(handle: &ModelHandle, config: &PipelineConfig) -> SwapResult<()> {
    let kind = handle.kind();
    let tensors: Vec<(&'static str, ArrayD<f32>)> = input_shapes(kind, config)
        .into_iter()
        .map(|(name, shape)| (name, ArrayD::zeros(IxDyn(&shape))))
        .collect();
    let inputs: Vec<TensorInput<'_>> = tensors
        .iter()
        .map(|(name, tensor)| TensorInput::new(name, tensor.view()))
        .collect();
    let output = handle.infer(&inputs)?;
    check_output(kind, config, output.shape())
}
