//! Pasting an aligned crop back into its source frame.

use headswap_core::core::{SwapError, SwapResult};
use headswap_core::domain::{AlignmentTransform, RawImage};
use headswap_core::utils::transform::{sample_bilinear, sample_scalar};
use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use nalgebra::Vector3;
use rayon::prelude::*;

/// Inverse-warps crops into frames with a feathered seam.
///
/// Pure: the same inputs always produce the same output and no state is kept
/// between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compositor {
    feather_px: u32,
}

impl Compositor {
    pub fn new(feather_px: u32) -> Self {
        Self { feather_px }
    }

    pub fn feather_px(&self) -> u32 {
        self.feather_px
    }

    /// Pastes `crop` into `frame` using the frame -> crop `transform`.
    ///
    /// Alpha ramps from 0 at the crop border to 1 at `feather_px` inside it.
    /// Frame pixels that map outside the crop are left untouched.
    pub fn paste(
        &self,
        crop: &RawImage,
        frame: &RawImage,
        transform: &AlignmentTransform,
    ) -> SwapResult<RawImage> {
        self.composite(crop, frame, transform, None)
    }

    /// Like [`Compositor::paste`], with alpha further limited to a feathered
    /// copy of `region` (row-major, crop-sized, values in [0, 1]).
    ///
    /// Frame pixels whose crop position lies outside `region` are left exactly
    /// as they were.
    pub fn paste_masked(
        &self,
        crop: &RawImage,
        frame: &RawImage,
        transform: &AlignmentTransform,
        region: &[f32],
    ) -> SwapResult<RawImage> {
        let size = crop.width();
        if region.len() != (size as usize) * (size as usize) {
            return Err(SwapError::tensor_operation(
                "paste region",
                &[size as usize, size as usize],
                &[region.len()],
            ));
        }
        let feathered = self.feather_region(region, size);
        self.composite(crop, frame, transform, Some(&feathered))
    }

    /// Softens a binary region without letting alpha leak outside it.
    fn feather_region(&self, region: &[f32], size: u32) -> Vec<f32> {
        if self.feather_px == 0 {
            return region.to_vec();
        }
        let gray = GrayImage::from_fn(size, size, |x, y| {
            let v = region[(y * size + x) as usize].clamp(0.0, 1.0);
            Luma([(v * 255.0).round() as u8])
        });
        let sigma = (self.feather_px as f32 / 2.0).max(0.5);
        let blurred = gaussian_blur_f32(&gray, sigma);
        region
            .iter()
            .zip(blurred.as_raw())
            .map(|(&r, &b)| r.clamp(0.0, 1.0) * (b as f32 / 255.0))
            .collect()
    }

    fn composite(
        &self,
        crop: &RawImage,
        frame: &RawImage,
        transform: &AlignmentTransform,
        region: Option<&[f32]>,
    ) -> SwapResult<RawImage> {
        if !crop.is_square() {
            return Err(SwapError::invalid_input(format!(
                "crops are square, got {:?}",
                crop.dimensions()
            )));
        }
        let size = crop.width();
        let forward = *transform.forward();
        let feather = self.feather_px as f32;
        let (frame_w, _) = frame.dimensions();
        let crop_rgb = crop.as_rgb();

        let mut out = frame.as_rgb().clone();
        let buffer: &mut [u8] = out.as_mut();
        buffer
            .par_chunks_mut((frame_w * 3) as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..frame_w {
                    let p = forward * Vector3::new(x as f32, y as f32, 1.0);
                    let mut alpha = border_alpha(p.x, p.y, size, feather);
                    if alpha <= 0.0 {
                        continue;
                    }
                    if let Some(region) = region {
                        alpha *= sample_scalar(region, size, size, p.x, p.y);
                        if alpha <= 0.0 {
                            continue;
                        }
                    }
                    let Some(src) = sample_bilinear(crop_rgb, p.x, p.y) else {
                        continue;
                    };
                    let index = (x * 3) as usize;
                    for c in 0..3 {
                        let base = row[index + c] as f32;
                        let blended = alpha * src[c] + (1.0 - alpha) * base;
                        row[index + c] = blended.round().clamp(0.0, 255.0) as u8;
                    }
                }
            });

        Ok(RawImage::new(out))
    }
}

/// Alpha at crop position `(x, y)`: 0 outside the crop, ramping to 1 at
/// `feather` pixels from the nearest edge.
fn border_alpha(x: f32, y: f32, size: u32, feather: f32) -> f32 {
    let max = (size.saturating_sub(1)) as f32;
    if !(0.0..=max).contains(&x) || !(0.0..=max).contains(&y) {
        return 0.0;
    }
    if feather <= 0.0 {
        return 1.0;
    }
    let distance = x.min(y).min(max - x).min(max - y);
    (distance / feather).clamp(0.0, 1.0)
}
