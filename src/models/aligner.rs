//! Face detection and canonical alignment.
//!
//! The detector sees a letterboxed `[1, 3, S, S]` tensor in `[0, 1]` and
//! returns `[1, N, 15]` rows of box, score and five landmarks in detector input
//! pixels. The primary face is warped onto the canonical five-point template.

use crate::config::PipelineConfig;
use crate::processors::{DetectionPostProcess, select_primary};
use crate::registry::ModelHandle;
use headswap_core::core::constants::{DETECTION_ROW_LEN, FACE_TEMPLATE_512, NUM_LANDMARKS};
use headswap_core::core::validation::validate_output_shape;
use headswap_core::core::{SwapError, SwapResult, TensorInput};
use headswap_core::domain::{AlignedFace, AlignmentTransform, FaceDetection, RawImage};
use headswap_core::utils::{
    PixelRange, estimate_similarity, image_to_tensor, letterbox, warp_to_crop,
};
use ndarray::{Axis, Ix2};
use tracing::{debug, warn};

/// Detects the primary face in a frame and cuts the canonical crop.
#[derive(Debug, Clone)]
pub struct FaceAligner {
    handle: ModelHandle,
    input_size: u32,
    canonical_size: u32,
    postprocess: DetectionPostProcess,
    template: [[f32; 2]; NUM_LANDMARKS],
}

impl FaceAligner {
    pub fn new(handle: ModelHandle, config: &PipelineConfig) -> Self {
        let ratio = config.canonical_size as f32 / 512.0;
        let template = FACE_TEMPLATE_512.map(|[x, y]| [x * ratio, y * ratio]);
        Self {
            handle,
            input_size: config.detector_input_size,
            canonical_size: config.canonical_size,
            postprocess: DetectionPostProcess::new(
                config.score_threshold,
                config.nms_iou_threshold,
            ),
            template,
        }
    }

    /// Landmark template in crop coordinates.
    pub fn template(&self) -> &[[f32; 2]; NUM_LANDMARKS] {
        &self.template
    }

    /// All faces surviving thresholding and NMS, in frame coordinates.
    pub fn detect(&self, image: &RawImage) -> SwapResult<Vec<FaceDetection>> {
        let (canvas, factor) = letterbox(image, self.input_size);
        let tensor = image_to_tensor(&canvas, PixelRange::Unit);
        let output = self.handle.infer(&[TensorInput::new("image", tensor.view())])?;
        validate_output_shape(
            self.handle.name(),
            output.shape(),
            &[Some(1), None, Some(DETECTION_ROW_LEN)],
        )?;
        let rows = output
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(|_| {
                SwapError::tensor_operation("detector rows", &[0, DETECTION_ROW_LEN], output.shape())
            })?;

        let detections: Vec<FaceDetection> = self
            .postprocess
            .apply(rows)
            .into_iter()
            .map(|det| det.scaled(factor))
            .collect();
        debug!(
            candidates = rows.nrows(),
            kept = detections.len(),
            "face detection"
        );
        Ok(detections)
    }

    /// Aligns the primary face, or returns `Ok(None)` when there is none.
    ///
    /// A detection whose landmarks are degenerate (coincident points) counts as
    /// no usable face.
    pub fn align(&self, image: &RawImage) -> SwapResult<Option<AlignedFace>> {
        let detections = self.detect(image)?;
        let Some(primary) = select_primary(&detections) else {
            return Ok(None);
        };

        let transform = match estimate_similarity(&primary.landmarks, &self.template) {
            Ok(transform) => transform,
            Err(err) => {
                warn!(
                    bbox = ?primary.bbox,
                    score = primary.score,
                    error = %err,
                    "detected face has unusable landmarks"
                );
                return Ok(None);
            }
        };

        let crop = warp_to_crop(image, &transform, self.canonical_size);
        debug!(
            faces = detections.len(),
            score = primary.score,
            scale = transform.scale(),
            "face aligned"
        );
        Ok(Some(AlignedFace::new(
            crop,
            transform,
            Some(primary),
            image.dimensions(),
        )))
    }

    /// Wraps an image that is already a canonical crop.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::InvalidInput`] unless the image is
    /// `canonical_size` square.
    pub fn align_canonical(&self, image: &RawImage) -> SwapResult<AlignedFace> {
        let size = self.canonical_size;
        if image.dimensions() != (size, size) {
            return Err(SwapError::invalid_input(format!(
                "alignment-free mode expects a {size}x{size} crop, got {}x{}",
                image.width(),
                image.height()
            )));
        }
        Ok(AlignedFace::new(
            image.clone(),
            AlignmentTransform::identity(),
            None,
            image.dimensions(),
        ))
    }
}
