//! Domain types passed between pipeline stages.

pub mod aligned;
pub mod geometry;
pub mod image;
pub mod mask;
pub mod model_kind;
pub mod transform;

pub use aligned::{AlignedFace, FaceDetection};
pub use geometry::{GeometryParameters, ParameterLayout};
pub use self::image::RawImage;
pub use mask::{FaceRegion, SegmentationMask};
pub use model_kind::ModelKind;
pub use transform::AlignmentTransform;
