//! Conversions between images and NCHW `f32` tensors.

use crate::core::errors::{SwapError, SwapResult};
use crate::domain::RawImage;
use image::RgbImage;
use ndarray::{Array4, ArrayD, ArrayView4, Ix4};

/// Value range of a model's image tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelRange {
    /// `pixel / 255`.
    Unit,
    /// `pixel / 127.5 - 1`.
    Signed,
}

impl PixelRange {
    #[inline]
    fn encode(self, value: u8) -> f32 {
        match self {
            PixelRange::Unit => value as f32 / 255.0,
            PixelRange::Signed => value as f32 / 127.5 - 1.0,
        }
    }

    #[inline]
    fn decode(self, value: f32) -> u8 {
        let scaled = match self {
            PixelRange::Unit => value * 255.0,
            PixelRange::Signed => (value + 1.0) * 127.5,
        };
        if scaled.is_nan() {
            return 0;
        }
        scaled.round().clamp(0.0, 255.0) as u8
    }
}

/// Converts an image into a `[1, 3, H, W]` tensor in the given range.
pub fn image_to_tensor(image: &RawImage, range: PixelRange) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let rgb = image.as_rgb();
    Array4::from_shape_fn((1, 3, h as usize, w as usize), |(_, c, y, x)| {
        range.encode(rgb.get_pixel(x as u32, y as u32).0[c])
    })
}

/// Converts an image into a `[1, 3, H, W]` tensor normalized as
/// `(pixel / 255 - mean) / std` per channel.
pub fn image_to_normalized_tensor(image: &RawImage, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let rgb = image.as_rgb();
    Array4::from_shape_fn((1, 3, h as usize, w as usize), |(_, c, y, x)| {
        let v = rgb.get_pixel(x as u32, y as u32).0[c] as f32 / 255.0;
        (v - mean[c]) / std[c]
    })
}

/// Converts a `[1, 3, H, W]` tensor back into an image, clamping out-of-range
/// values.
pub fn tensor_to_image(tensor: ArrayView4<'_, f32>, range: PixelRange) -> SwapResult<RawImage> {
    let shape = tensor.shape();
    if shape[0] != 1 || shape[1] != 3 {
        return Err(SwapError::tensor_operation(
            "tensor to image",
            &[1, 3, shape[2], shape[3]],
            shape,
        ));
    }
    let (h, w) = (shape[2] as u32, shape[3] as u32);
    let img = RgbImage::from_fn(w, h, |x, y| {
        let (xi, yi) = (x as usize, y as usize);
        image::Rgb([
            range.decode(tensor[[0, 0, yi, xi]]),
            range.decode(tensor[[0, 1, yi, xi]]),
            range.decode(tensor[[0, 2, yi, xi]]),
        ])
    });
    Ok(RawImage::new(img))
}

/// Reinterprets a dynamic-rank model output as 4-D.
pub fn as_nchw<'a>(tensor: &'a ArrayD<f32>, context: &str) -> SwapResult<ArrayView4<'a, f32>> {
    tensor
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|_| SwapError::tensor_operation(context, &[1, 0, 0, 0], tensor.shape()))
}

/// Builds a `[1, 1, H, W]` tensor from a row-major single-channel buffer.
pub fn mask_to_tensor(mask: &[f32], width: u32, height: u32) -> SwapResult<Array4<f32>> {
    Ok(Array4::from_shape_vec(
        (1, 1, height as usize, width as usize),
        mask.to_vec(),
    )?)
}
