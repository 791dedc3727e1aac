//! Model-free processing between stages.
//!
//! * [`detection_postprocess`] - Thresholding, NMS and primary-face selection
//! * [`compositor`] - Feathered paste of a crop back into its frame

pub mod compositor;
pub mod detection_postprocess;

pub use compositor::Compositor;
pub use detection_postprocess::{DetectionPostProcess, select_primary};
