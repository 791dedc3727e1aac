//! Image decoding, encoding and pixel-level helpers.
//!
//! Every function takes shared references and returns new images; nothing here
//! mutates a [`RawImage`] in place.

use crate::core::errors::{SwapError, SwapResult};
use crate::core::validation::validate_image_dimensions;
use crate::domain::RawImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Encoding used for result images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "format")]
pub enum OutputFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG with the given quality (1-100).
    Jpeg { quality: u8 },
}

impl OutputFormat {
    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg { .. } => "image/jpeg",
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// Decodes encoded image bytes of any supported format into RGB.
///
/// # Errors
///
/// Returns [`SwapError::ImageDecode`] for undecodable bytes and
/// [`SwapError::InvalidInput`] for empty input or unusable dimensions.
pub fn decode_image(bytes: &[u8]) -> SwapResult<RawImage> {
    if bytes.is_empty() {
        return Err(SwapError::invalid_input("image payload is empty"));
    }
    let decoded = image::load_from_memory(bytes).map_err(SwapError::ImageDecode)?;
    let rgb = decoded.to_rgb8();
    validate_image_dimensions(rgb.width(), rgb.height(), "decoded image")?;
    Ok(RawImage::new(rgb))
}

/// Encodes an image in the requested format.
pub fn encode_image(image: &RawImage, format: OutputFormat) -> SwapResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.as_rgb();
    match format {
        OutputFormat::Png => rgb
            .write_with_encoder(PngEncoder::new(&mut buffer))
            .map_err(SwapError::ImageEncode)?,
        OutputFormat::Jpeg { quality } => rgb
            .write_with_encoder(JpegEncoder::new_with_quality(
                &mut buffer,
                quality.clamp(1, 100),
            ))
            .map_err(SwapError::ImageEncode)?,
    }
    Ok(buffer)
}

/// Bilinear resize to exact dimensions.
pub fn resize(image: &RawImage, width: u32, height: u32) -> RawImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    RawImage::new(imageops::resize(
        image.as_rgb(),
        width,
        height,
        FilterType::Triangle,
    ))
}

/// Resizes to `height`, preserving aspect ratio.
pub fn resize_to_height(image: &RawImage, height: u32) -> RawImage {
    let scale = height as f32 / image.height() as f32;
    let width = ((image.width() as f32 * scale).round() as u32).max(1);
    resize(image, width, height)
}

/// Aspect-preserving resize into a `size`x`size` canvas, padded bottom/right
/// with zeros.
///
/// Returns the canvas and the factor that maps canvas coordinates back to the
/// original image (`original = canvas * factor`).
pub fn letterbox(image: &RawImage, size: u32) -> (RawImage, f32) {
    let (w, h) = image.dimensions();
    let scale = size as f32 / w.max(h) as f32;
    let nw = ((w as f32 * scale).round() as u32).clamp(1, size);
    let nh = ((h as f32 * scale).round() as u32).clamp(1, size);
    let resized = resize(image, nw, nh);
    let mut canvas = RgbImage::new(size, size);
    imageops::replace(&mut canvas, resized.as_rgb(), 0, 0);
    (RawImage::new(canvas), 1.0 / scale)
}

/// Places images side by side after resizing each to `height`.
pub fn concat_horizontal(images: &[&RawImage], height: u32) -> SwapResult<RawImage> {
    if images.is_empty() {
        return Err(SwapError::invalid_input("nothing to concatenate"));
    }
    let resized: Vec<RawImage> = images
        .iter()
        .map(|img| resize_to_height(img, height))
        .collect();
    let total_width: u32 = resized.iter().map(|img| img.width()).sum();
    let mut canvas = RgbImage::new(total_width, height);
    let mut offset = 0i64;
    for img in &resized {
        imageops::replace(&mut canvas, img.as_rgb(), offset, 0);
        offset += img.width() as i64;
    }
    Ok(RawImage::new(canvas))
}
