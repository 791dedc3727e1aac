//! Face parsing labels and per-pixel masks.

use crate::core::errors::{SwapError, SwapResult};
use image::{GrayImage, Luma};

/// CelebAMask-HQ face parsing classes, in model channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceRegion {
    Background = 0,
    Skin = 1,
    Nose = 2,
    EyeGlasses = 3,
    LeftEye = 4,
    RightEye = 5,
    LeftBrow = 6,
    RightBrow = 7,
    LeftEar = 8,
    RightEar = 9,
    Mouth = 10,
    UpperLip = 11,
    LowerLip = 12,
    Hair = 13,
    Hat = 14,
    EarRing = 15,
    Necklace = 16,
    Neck = 17,
    Cloth = 18,
}

impl FaceRegion {
    /// All classes, indexed by channel.
    pub const ALL: [FaceRegion; 19] = [
        FaceRegion::Background,
        FaceRegion::Skin,
        FaceRegion::Nose,
        FaceRegion::EyeGlasses,
        FaceRegion::LeftEye,
        FaceRegion::RightEye,
        FaceRegion::LeftBrow,
        FaceRegion::RightBrow,
        FaceRegion::LeftEar,
        FaceRegion::RightEar,
        FaceRegion::Mouth,
        FaceRegion::UpperLip,
        FaceRegion::LowerLip,
        FaceRegion::Hair,
        FaceRegion::Hat,
        FaceRegion::EarRing,
        FaceRegion::Necklace,
        FaceRegion::Neck,
        FaceRegion::Cloth,
    ];

    /// Maps a channel index to its class. Channels beyond the known 19 map to
    /// `Background`.
    pub fn from_index(index: usize) -> FaceRegion {
        Self::ALL.get(index).copied().unwrap_or(FaceRegion::Background)
    }

    /// Classes that form the editable head region.
    ///
    /// Neck, clothing, necklace and background are never part of it; hair and
    /// hat only when `include_hair` is set.
    pub fn is_head(&self, include_hair: bool) -> bool {
        match self {
            FaceRegion::Background
            | FaceRegion::Necklace
            | FaceRegion::Neck
            | FaceRegion::Cloth => false,
            FaceRegion::Hair | FaceRegion::Hat => include_hair,
            _ => true,
        }
    }
}

/// Per-pixel class map with explicit dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    labels: Vec<FaceRegion>,
}

impl SegmentationMask {
    /// Wraps a row-major label buffer.
    pub fn new(width: u32, height: u32, labels: Vec<FaceRegion>) -> SwapResult<Self> {
        let expected = width as usize * height as usize;
        if labels.len() != expected {
            return Err(SwapError::tensor_operation(
                "segmentation mask labels",
                &[height as usize, width as usize],
                &[labels.len()],
            ));
        }
        Ok(Self {
            width,
            height,
            labels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Label at `(x, y)`.
    pub fn label(&self, x: u32, y: u32) -> FaceRegion {
        self.labels[(y * self.width + x) as usize]
    }

    pub fn labels(&self) -> &[FaceRegion] {
        &self.labels
    }

    /// Binary head-region mask (`1.0` inside, `0.0` outside), row-major.
    pub fn head_region(&self, include_hair: bool) -> Vec<f32> {
        self.labels
            .iter()
            .map(|r| if r.is_head(include_hair) { 1.0 } else { 0.0 })
            .collect()
    }

    /// Number of pixels carrying `region`.
    pub fn count(&self, region: FaceRegion) -> usize {
        self.labels.iter().filter(|&&r| r == region).count()
    }

    /// Union of the head regions of two masks of identical size.
    ///
    /// # Panics
    ///
    /// Panics when the mask dimensions differ.
    pub fn union_head_region(&self, other: &SegmentationMask, include_hair: bool) -> Vec<f32> {
        assert_eq!(
            self.dimensions(),
            other.dimensions(),
            "masks must share dimensions"
        );
        self.labels
            .iter()
            .zip(&other.labels)
            .map(|(a, b)| {
                if a.is_head(include_hair) || b.is_head(include_hair) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Renders the label map as a grayscale image of class indices.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([self.label(x, y) as u8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index() {
        assert_eq!(FaceRegion::from_index(13), FaceRegion::Hair);
        assert_eq!(FaceRegion::from_index(42), FaceRegion::Background);
        for (i, region) in FaceRegion::ALL.iter().enumerate() {
            assert_eq!(*region as usize, i);
        }
    }

    #[test]
    fn test_head_region_respects_hair_flag() {
        let mask = SegmentationMask::new(
            2,
            2,
            vec![
                FaceRegion::Skin,
                FaceRegion::Hair,
                FaceRegion::Neck,
                FaceRegion::Background,
            ],
        )
        .unwrap();
        assert_eq!(mask.head_region(true), vec![1.0, 1.0, 0.0, 0.0]);
        assert_eq!(mask.head_region(false), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(mask.count(FaceRegion::Hair), 1);
        assert_eq!(mask.to_gray_image().get_pixel(1, 0).0, [13]);
    }

    #[test]
    fn test_union() {
        let a = SegmentationMask::new(2, 1, vec![FaceRegion::Skin, FaceRegion::Background]).unwrap();
        let b = SegmentationMask::new(2, 1, vec![FaceRegion::Background, FaceRegion::Nose]).unwrap();
        assert_eq!(a.union_head_region(&b, true), vec![1.0, 1.0]);
    }

    #[test]
    fn test_wrong_label_count() {
        assert!(SegmentationMask::new(3, 3, vec![FaceRegion::Skin; 8]).is_err());
    }
}
