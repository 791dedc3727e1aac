//! Stage adapters around the five models.
//!
//! Each adapter owns a [`ModelHandle`](crate::registry::ModelHandle), turns
//! domain values into the model's tensor contract, runs it and validates the
//! output before converting it back.

pub mod aligner;
pub mod blender;
pub mod geometry;
pub mod parser;
pub mod renderer;

pub use aligner::FaceAligner;
pub use blender::Blender;
pub use geometry::GeometryEstimator;
pub use parser::FaceParser;
pub use renderer::{Renderer, compose_driving_parameters};
