//! Face Swap Example
//!
//! Transfers the identity of a source face onto a target photo.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example swap_face -- [OPTIONS] --source <SOURCE> --target <TARGET>
//! ```
//!
//! # Arguments
//!
//! * `-m, --model-dir` - Directory holding detector.onnx, geometry.onnx, renderer.onnx, parser.onnx and blender.onnx
//! * `-c, --config` - Registry configuration file (JSON or TOML); overrides `--model-dir`
//! * `-s, --source` - Image providing the identity
//! * `-t, --target` - Image providing pose, expression and background
//! * `-o, --output` - Where to write the result
//! * `-d, --device` - Device to use for inference (e.g., 'cpu', 'cuda', 'cuda:0')
//!
//! # Example
//!
//! ```bash
//! cargo run --example swap_face -- -m pretrained_models -s me.jpg -t poster.jpg -o out.png
//! ```

use clap::Parser;
use headswap::config::ConfigLoader;
use headswap::core::config::Device;
use headswap::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Command-line arguments for the face swap example
#[derive(Parser)]
#[command(name = "swap_face")]
#[command(about = "Face Swap Example - re-renders a source identity into a target photo")]
struct Args {
    /// Directory with the five model files
    #[arg(short, long, default_value = "pretrained_models")]
    model_dir: PathBuf,

    /// Registry configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Image providing the identity
    #[arg(short, long)]
    source: PathBuf,

    /// Image providing pose, expression and background
    #[arg(short, long)]
    target: PathBuf,

    /// Output path; the extension selects PNG or JPEG
    #[arg(short, long, default_value = "swapped.png")]
    output: PathBuf,

    /// Device to use for inference (e.g., 'cpu', 'cuda', 'cuda:0')
    #[arg(short, long, default_value = "auto")]
    device: String,

    /// Session pool size for concurrent inference
    #[arg(long, default_value = "1")]
    session_pool_size: usize,

    /// Inputs are already aligned canonical crops
    #[arg(long)]
    no_align: bool,

    /// Return the blended crop instead of the full frame
    #[arg(long)]
    crop_only: bool,

    /// Keep hair out of the blended region
    #[arg(long)]
    exclude_hair: bool,

    /// Write source, target and result side by side
    #[arg(long)]
    side_by_side: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    headswap::utils::init_tracing();
    let args = Args::parse();

    let device = Device::parse(&args.device)
        .ok_or_else(|| format!("unrecognised device '{}'", args.device))?;
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => RegistryConfig::from_model_dir(&args.model_dir),
    };
    config = config
        .with_device(device)
        .with_session_pool_size(args.session_pool_size);
    if args.exclude_hair {
        let pipeline = config.pipeline.clone().with_hair(false);
        config = config.with_pipeline(pipeline);
    }

    let start = Instant::now();
    let registry = ModelRegistry::load(&config)?;
    info!("Models loaded in {:.2?}", start.elapsed());
    let service = SwapService::new(Arc::new(InferencePipeline::new(&registry)));

    let format = match args.output.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => OutputFormat::Jpeg { quality: 95 },
        _ => OutputFormat::Png,
    };
    let options = SwapOptions::default()
        .with_crop_align(!args.no_align)
        .with_full_frame(!args.crop_only)
        .with_side_by_side(args.side_by_side)
        .with_output_format(format);

    let source = std::fs::read(&args.source)?;
    let target = std::fs::read(&args.target)?;
    let result = service.handle(&source, &target, &options);

    let status = match result {
        Ok(response) => {
            std::fs::write(&args.output, &response.bytes)?;
            info!(
                "Wrote {}x{} result to {} in {:.2?}",
                response.width,
                response.height,
                args.output.display(),
                response.report.total
            );
            for (stage, elapsed) in &response.report.stage_timings {
                info!("  {stage}: {elapsed:.2?}");
            }
            Ok(())
        }
        Err(err) => {
            error!("Swap failed: {err}");
            Err(err.into())
        }
    };

    let report = registry.shutdown();
    info!("Released {} models", report.released.len());
    status
}
