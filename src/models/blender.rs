//! Mask-restricted blending of the rendered face into the target crop.

use crate::config::{BlendConfig, PipelineConfig};
use crate::registry::ModelHandle;
use headswap_core::core::validation::validate_output_shape;
use headswap_core::core::{SwapResult, TensorInput};
use headswap_core::domain::{AlignedFace, RawImage, SegmentationMask};
use headswap_core::utils::tensor::{as_nchw, mask_to_tensor};
use headswap_core::utils::{PixelRange, image_to_tensor, tensor_to_image};
use tracing::debug;

/// Fuses a rendered face into a target crop.
///
/// Inputs `rendered`, `target` as `[1, 3, C, C]` in `[-1, 1]` and
/// `rendered_mask`, `target_mask` as `[1, 1, C, C]` binary head regions.
/// Output `[1, 3, C, C]` in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct Blender {
    handle: ModelHandle,
    canonical_size: u32,
    config: BlendConfig,
}

impl Blender {
    pub fn new(handle: ModelHandle, config: &PipelineConfig) -> Self {
        Self {
            handle,
            canonical_size: config.canonical_size,
            config: config.blend.clone(),
        }
    }

    /// The editable region: union of both head regions, row-major.
    ///
    /// # Panics
    ///
    /// Panics when the masks have different dimensions.
    pub fn editable_region(
        &self,
        rendered_mask: &SegmentationMask,
        target_mask: &SegmentationMask,
    ) -> Vec<f32> {
        rendered_mask.union_head_region(target_mask, self.config.include_hair)
    }

    /// Blends `rendered` into the target crop.
    ///
    /// Every pixel outside [`Blender::editable_region`] is copied from the
    /// target crop regardless of what the model returns.
    ///
    /// # Panics
    ///
    /// Panics when a mask does not match the crop dimensions.
    pub fn blend(
        &self,
        rendered: &RawImage,
        target: &AlignedFace,
        rendered_mask: &SegmentationMask,
        target_mask: &SegmentationMask,
    ) -> SwapResult<RawImage> {
        let crop = target.image();
        assert_eq!(
            rendered_mask.dimensions(),
            crop.dimensions(),
            "rendered mask must match the crop"
        );
        assert_eq!(
            target_mask.dimensions(),
            crop.dimensions(),
            "target mask must match the crop"
        );

        let (w, h) = crop.dimensions();
        let include_hair = self.config.include_hair;
        let rendered_t = image_to_tensor(rendered, PixelRange::Signed);
        let target_t = image_to_tensor(crop, PixelRange::Signed);
        let rendered_m = mask_to_tensor(&rendered_mask.head_region(include_hair), w, h)?;
        let target_m = mask_to_tensor(&target_mask.head_region(include_hair), w, h)?;

        let output = self.handle.infer(&[
            TensorInput::new("rendered", rendered_t.view()),
            TensorInput::new("target", target_t.view()),
            TensorInput::new("rendered_mask", rendered_m.view()),
            TensorInput::new("target_mask", target_m.view()),
        ])?;
        let c = Some(self.canonical_size as usize);
        validate_output_shape(self.handle.name(), output.shape(), &[Some(1), Some(3), c, c])?;
        let blended = tensor_to_image(as_nchw(&output, "blender output")?, PixelRange::Signed)?;

        let region = self.editable_region(rendered_mask, target_mask);
        let mut out = blended.into_rgb();
        for ((dst, src), inside) in out
            .pixels_mut()
            .zip(crop.as_rgb().pixels())
            .zip(&region)
        {
            if *inside == 0.0 {
                *dst = *src;
            }
        }
        debug!(
            editable_pixels = region.iter().filter(|v| **v > 0.0).count(),
            "crop blended"
        );
        Ok(RawImage::new(out))
    }
}
