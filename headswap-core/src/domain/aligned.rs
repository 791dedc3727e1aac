//! Aligned face crops and the detections they were cut from.

use super::{AlignmentTransform, RawImage};
use crate::core::constants::NUM_LANDMARKS;

/// One detected face in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDetection {
    /// `[x1, y1, x2, y2]`.
    pub bbox: [f32; 4],
    /// Left eye, right eye, nose tip, left and right mouth corners.
    pub landmarks: [[f32; 2]; NUM_LANDMARKS],
    /// Detector confidence.
    pub score: f32,
}

impl FaceDetection {
    /// Box width, clamped at zero.
    pub fn width(&self) -> f32 {
        (self.bbox[2] - self.bbox[0]).max(0.0)
    }

    /// Box height, clamped at zero.
    pub fn height(&self) -> f32 {
        (self.bbox[3] - self.bbox[1]).max(0.0)
    }

    /// Box area.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another detection's box.
    pub fn iou(&self, other: &FaceDetection) -> f32 {
        let x1 = self.bbox[0].max(other.bbox[0]);
        let y1 = self.bbox[1].max(other.bbox[1]);
        let x2 = self.bbox[2].min(other.bbox[2]);
        let y2 = self.bbox[3].min(other.bbox[3]);
        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }

    /// Scales box and landmarks by `factor` (detector input -> frame).
    pub fn scaled(&self, factor: f32) -> FaceDetection {
        let mut out = *self;
        for v in out.bbox.iter_mut() {
            *v *= factor;
        }
        for point in out.landmarks.iter_mut() {
            point[0] *= factor;
            point[1] *= factor;
        }
        out
    }
}

/// A canonical square face crop plus the transform that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFace {
    image: RawImage,
    transform: AlignmentTransform,
    detection: Option<FaceDetection>,
    frame_size: (u32, u32),
}

impl AlignedFace {
    /// Assembles an aligned face.
    ///
    /// # Panics
    ///
    /// Panics if `image` is not square; alignment always produces square crops.
    pub fn new(
        image: RawImage,
        transform: AlignmentTransform,
        detection: Option<FaceDetection>,
        frame_size: (u32, u32),
    ) -> Self {
        assert!(
            image.is_square(),
            "aligned crops are square, got {:?}",
            image.dimensions()
        );
        Self {
            image,
            transform,
            detection,
            frame_size,
        }
    }

    /// The crop pixels.
    pub fn image(&self) -> &RawImage {
        &self.image
    }

    /// Side length of the crop.
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Frame -> crop transform.
    pub fn transform(&self) -> &AlignmentTransform {
        &self.transform
    }

    /// The detection the crop was aligned from; `None` for canonical inputs.
    pub fn detection(&self) -> Option<&FaceDetection> {
        self.detection.as_ref()
    }

    /// `(width, height)` of the frame the crop was cut from.
    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }
}
