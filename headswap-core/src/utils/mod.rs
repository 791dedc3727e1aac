//! Image, tensor and geometric helpers used by the stage adapters.

pub mod image;
pub mod tensor;
pub mod transform;

pub use self::image::{
    OutputFormat, concat_horizontal, decode_image, encode_image, letterbox, resize,
};
pub use tensor::{PixelRange, image_to_normalized_tensor, image_to_tensor, tensor_to_image};
pub use transform::{estimate_similarity, warp_to_crop};
