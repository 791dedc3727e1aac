use super::*;
use crate::core::errors::{SimpleError, SwapResult};
use crate::core::inference::{InferenceEngine, TensorInput};
use ndarray::{ArrayD, IxDyn};
use ort::session::SessionInputs;
use ort::value::TensorRef;
use std::borrow::Cow;
use std::sync::atomic::Ordering;

impl OrtInfer {
    fn shape_summary(inputs: &[TensorInput<'_>]) -> String {
        inputs
            .iter()
            .map(|input| format!("{}{:?}", input.name, input.tensor.shape()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl InferenceEngine for OrtInfer {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn infer(&self, inputs: &[TensorInput<'_>]) -> SwapResult<ArrayD<f32>> {
        if inputs.len() != self.input_names.len() {
            return Err(SwapError::model_execution(
                &self.model_name,
                "input binding",
                SimpleError::new(format!(
                    "model expects {} inputs ({:?}), got {}",
                    self.input_names.len(),
                    self.input_names,
                    inputs.len()
                )),
            ));
        }

        // Contiguous copies are only made for views that need them.
        let contiguous: Vec<_> = inputs
            .iter()
            .map(|input| input.tensor.as_standard_layout())
            .collect();

        let mut bound = Vec::with_capacity(inputs.len());
        for (name, array) in self.input_names.iter().zip(contiguous.iter()) {
            let dims: Vec<i64> = array.shape().iter().map(|&d| d as i64).collect();
            let data = array.as_slice().ok_or_else(|| {
                SwapError::internal(format!("input '{name}' is not contiguous after relayout"))
            })?;
            let tensor_ref = TensorRef::from_array_view((dims, data)).map_err(|e| {
                SwapError::model_execution(&self.model_name, format!("binding input '{name}'"), e)
            })?;
            bound.push((Cow::Borrowed(name.as_str()), tensor_ref.into()));
        }

        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut slot = self.sessions[idx].lock().map_err(|_| {
            SwapError::model_execution(
                &self.model_name,
                format!(
                    "acquiring session lock for session {}/{}",
                    idx,
                    self.sessions.len()
                ),
                SimpleError::new("session lock poisoned"),
            )
        })?;
        let session = slot.as_mut().ok_or_else(|| self.released_error())?;

        let ort_inputs: SessionInputs<'_, '_, 0> = SessionInputs::ValueMap(bound);
        let outputs = session.run(ort_inputs).map_err(|e| {
            SwapError::model_execution(
                &self.model_name,
                format!("forward pass with inputs {}", Self::shape_summary(inputs)),
                e,
            )
        })?;

        let (shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                SwapError::model_execution(
                    &self.model_name,
                    format!("extracting output '{}' as f32", self.output_name),
                    e,
                )
            })?;
        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        Ok(ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec())?)
    }

    fn release(&self) {
        let mut released = 0usize;
        for slot in &self.sessions {
            let mut guard = match slot.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if guard.take().is_some() {
                released += 1;
            }
        }
        tracing::debug!(model = %self.model_name, released, "released ONNX sessions");
    }
}
