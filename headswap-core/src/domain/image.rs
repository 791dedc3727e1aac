//! Immutable decoded image buffer.

use image::{Rgb, RgbImage};

/// A decoded 8-bit RGB image.
///
/// Only shared accessors are exposed. Every transformation in the crate
/// produces a new `RawImage`, so a value handed to a stage is never changed
/// behind the caller's back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    inner: RgbImage,
}

impl RawImage {
    /// Wraps an existing RGB buffer.
    pub fn new(inner: RgbImage) -> Self {
        Self { inner }
    }

    /// Creates an image filled with one color.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            inner: RgbImage::from_pixel(width, height, Rgb(color)),
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    /// True when width equals height.
    pub fn is_square(&self) -> bool {
        self.width() == self.height()
    }

    /// Pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.inner.get_pixel(x, y).0
    }

    /// Borrow of the underlying buffer.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.inner
    }

    /// Raw interleaved RGB bytes.
    pub fn as_raw(&self) -> &[u8] {
        self.inner.as_raw()
    }

    /// Consumes the wrapper and returns the buffer.
    pub fn into_rgb(self) -> RgbImage {
        self.inner
    }

    /// Mean intensity over all channels, in [0, 255].
    pub fn mean_intensity(&self) -> f32 {
        let raw = self.inner.as_raw();
        if raw.is_empty() {
            return 0.0;
        }
        let sum: u64 = raw.iter().map(|&v| v as u64).sum();
        sum as f32 / raw.len() as f32
    }
}

impl From<RgbImage> for RawImage {
    fn from(inner: RgbImage) -> Self {
        Self::new(inner)
    }
}
