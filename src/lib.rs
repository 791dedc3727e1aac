//! # headswap
//!
//! Face identity transfer on top of ONNX Runtime: the identity of a source face
//! is re-rendered with the pose, expression and lighting of a target face and
//! composited back into the target photo.
//!
//! ## Stages
//!
//! 1. Detection and alignment of both faces onto a canonical crop
//! 2. 3DMM coefficient estimation
//! 3. Re-rendering with source identity on target geometry
//! 4. Face parsing of the rendered and target crops
//! 5. Blending restricted to the head region
//! 6. Feathered paste back into the target frame
//!
//! ## Modules
//!
//! * [`config`] - Registry, model source and stage configuration
//! * [`registry`] - Loading, canary validation and release of the five models
//! * [`models`] - Stage adapters around each model
//! * [`processors`] - Detection post-processing and compositing
//! * [`pipeline`] - The per-request state machine
//! * [`service`] - Encoding, client errors, upload spooling and health
//! * [`utils`] - Tracing setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use headswap::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RegistryConfig::from_model_dir("pretrained_models");
//! let registry = ModelRegistry::load(&config)?;
//! let pipeline = Arc::new(InferencePipeline::new(&registry));
//!
//! let source = std::fs::read("source.jpg")?;
//! let target = std::fs::read("target.jpg")?;
//! let swapped = pipeline.run(&source, &target, &SwapOptions::default())?;
//! let png = encode_image(&swapped, OutputFormat::Png)?;
//! std::fs::write("swapped.png", png)?;
//!
//! registry.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod registry;
pub mod service;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use headswap_core::{core, domain};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{
        BlendConfig, ConfigFormat, ConfigLoader, ModelSource, PipelineConfig, RegistryConfig,
    };
    pub use crate::pipeline::{
        CancellationToken, InferencePipeline, PipelineOutcome, PipelineReport, PipelineState,
        SwapOptions,
    };
    pub use crate::registry::{ModelHandle, ModelRegistry, RegistryCell, ShutdownReport};
    pub use crate::service::{ClientError, HealthStatus, SwapService, UploadSpool};
    pub use headswap_core::prelude::*;
}
