//! Face parsing.

use crate::config::PipelineConfig;
use crate::registry::ModelHandle;
use headswap_core::core::constants::{IMAGENET_MEAN, IMAGENET_STD, NUM_PARSING_CLASSES};
use headswap_core::core::validation::validate_output_shape;
use headswap_core::core::{SwapError, SwapResult, TensorInput};
use headswap_core::domain::{AlignedFace, FaceRegion, RawImage, SegmentationMask};
use headswap_core::utils::image_to_normalized_tensor;
use headswap_core::utils::tensor::as_nchw;
use rayon::prelude::*;
use tracing::debug;

/// Per-pixel semantic segmentation of canonical crops.
///
/// Input `[1, 3, C, C]` ImageNet-normalised, output `[1, K, C, C]` logits with
/// `K >= 19`; each pixel takes the arg-max class.
#[derive(Debug, Clone)]
pub struct FaceParser {
    handle: ModelHandle,
    canonical_size: u32,
}

impl FaceParser {
    pub fn new(handle: ModelHandle, config: &PipelineConfig) -> Self {
        Self {
            handle,
            canonical_size: config.canonical_size,
        }
    }

    pub fn segment(&self, face: &AlignedFace) -> SwapResult<SegmentationMask> {
        self.segment_image(face.image())
    }

    /// Segments a canonical-size image.
    ///
    /// # Errors
    ///
    /// [`SwapError::InvalidInput`] for an image of any other size and
    /// [`SwapError::ModelExecution`] when the output grid differs from the
    /// input grid.
    pub fn segment_image(&self, image: &RawImage) -> SwapResult<SegmentationMask> {
        let size = self.canonical_size;
        if image.dimensions() != (size, size) {
            return Err(SwapError::invalid_input(format!(
                "face parsing expects a {size}x{size} crop, got {}x{}",
                image.width(),
                image.height()
            )));
        }
        let tensor = image_to_normalized_tensor(image, IMAGENET_MEAN, IMAGENET_STD);
        let output = self.handle.infer(&[TensorInput::new("image", tensor.view())])?;

        let s = Some(size as usize);
        validate_output_shape(self.handle.name(), output.shape(), &[Some(1), None, s, s])?;
        let classes = output.shape()[1];
        if classes < NUM_PARSING_CLASSES {
            return Err(SwapError::output_contract(
                self.handle.name(),
                &format!("at least {NUM_PARSING_CLASSES} class channels"),
                output.shape(),
            ));
        }

        let logits = as_nchw(&output, "parser output")?;
        let width = size as usize;
        let labels: Vec<FaceRegion> = (0..width * width)
            .into_par_iter()
            .map(|i| {
                let (y, x) = (i / width, i % width);
                let mut best = 0;
                for k in 1..classes {
                    if logits[[0, k, y, x]] > logits[[0, best, y, x]] {
                        best = k;
                    }
                }
                FaceRegion::from_index(best)
            })
            .collect();

        let mask = SegmentationMask::new(size, size, labels)?;
        debug!(
            classes,
            head_pixels = mask.labels().iter().filter(|r| r.is_head(true)).count(),
            "face parsed"
        );
        Ok(mask)
    }
}
