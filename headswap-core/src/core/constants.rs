//! Constants shared by the swap pipeline.

/// Side length of the canonical aligned face crop.
pub const DEFAULT_CANONICAL_SIZE: u32 = 512;

/// Side length of the square letterboxed detector input.
pub const DEFAULT_DETECTOR_INPUT_SIZE: u32 = 640;

/// Side length of the geometry regressor input.
pub const DEFAULT_GEOMETRY_INPUT_SIZE: u32 = 224;

/// Minimum detection score for a face to be considered.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// IoU above which overlapping detections are suppressed.
pub const DEFAULT_NMS_IOU_THRESHOLD: f32 = 0.4;

/// Width of the alpha ramp at the pasted crop border, in crop pixels.
pub const DEFAULT_FEATHER_PX: u32 = 16;

/// Number of facial landmarks produced by the detector.
pub const NUM_LANDMARKS: usize = 5;

/// Values per detector output row: box (4), score (1), landmarks (10).
pub const DETECTION_ROW_LEN: usize = 4 + 1 + NUM_LANDMARKS * 2;

/// Number of classes produced by the face parser.
pub const NUM_PARSING_CLASSES: usize = 19;

/// Default number of ONNX Runtime sessions per model.
pub const DEFAULT_SESSION_POOL_SIZE: usize = 1;

/// Determinant magnitude below which an affine transform is treated as degenerate.
pub const DEGENERATE_DETERMINANT_EPSILON: f32 = 1e-8;

/// ImageNet channel means (RGB), used by the face parser.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations (RGB), used by the face parser.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Five-point face template for a 512x512 crop.
///
/// Order: left eye, right eye, nose tip, left mouth corner, right mouth corner.
/// Scaled linearly for other canonical sizes.
pub const FACE_TEMPLATE_512: [[f32; 2]; NUM_LANDMARKS] = [
    [192.98138, 239.94708],
    [318.90277, 240.19366],
    [256.63416, 314.01935],
    [201.26117, 371.41043],
    [313.08905, 371.15118],
];
