//! Deterministic stand-ins for the five models, plus synthetic images.
//!
//! Each fake honours the tensor contract of its stage, counts invocations and
//! fails every call after `release`.

use crate::config::PipelineConfig;
use crate::pipeline::CancellationToken;
use crate::registry::ModelRegistry;
use headswap_core::core::constants::{
    DETECTION_ROW_LEN, FACE_TEMPLATE_512, IMAGENET_MEAN, IMAGENET_STD, NUM_PARSING_CLASSES,
};
use headswap_core::core::{InferenceEngine, SimpleError, SwapError, SwapResult, TensorInput};
use headswap_core::domain::{AlignedFace, AlignmentTransform, ModelKind, RawImage};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use ndarray::{Array2, Array4, ArrayD, IxDyn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Background colour of synthetic frames; never bright enough to be a face.
pub const BACKGROUND: [u8; 3] = [40, 90, 160];

/// Small sizes keep the tests fast.
pub fn small_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_canonical_size(128)
        .with_detector_input_size(256)
        .with_geometry_input_size(64)
        .with_feather_px(8)
}

/// A frame with a horizontal background gradient and one white disc "face".
pub fn portrait_with_face(width: u32, height: u32, center: (i32, i32), radius: i32) -> RawImage {
    let mut rgb = RgbImage::from_fn(width, height, |x, _| {
        Rgb([BACKGROUND[0] + (x % 60) as u8, BACKGROUND[1], BACKGROUND[2]])
    });
    draw_filled_circle_mut(&mut rgb, center, radius, Rgb([255, 255, 255]));
    RawImage::new(rgb)
}

/// A canonical crop of a single colour with the identity transform.
pub fn aligned_face(color: [u8; 3]) -> AlignedFace {
    let size = small_config().canonical_size;
    AlignedFace::new(
        RawImage::filled(size, size, color),
        AlignmentTransform::identity(),
        None,
        (size, size),
    )
}

#[derive(Debug, Default)]
struct FakeState {
    calls: AtomicUsize,
    released: AtomicBool,
}

impl FakeState {
    fn begin(&self, name: &str) -> SwapResult<()> {
        if self.released.load(Ordering::SeqCst) {
            return Err(SwapError::model_execution(
                name,
                "inference",
                SimpleError::new("released"),
            ));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

macro_rules! fake_common {
    ($ty:ty) => {
        impl $ty {
            pub fn calls(&self) -> usize {
                self.state.calls.load(Ordering::SeqCst)
            }

            pub fn reset_calls(&self) {
                self.state.calls.store(0, Ordering::SeqCst);
            }

            pub fn is_released(&self) -> bool {
                self.state.released.load(Ordering::SeqCst)
            }
        }
    };
}

fn input<'s, 'a>(inputs: &'s [TensorInput<'a>], name: &str) -> SwapResult<&'s TensorInput<'a>> {
    inputs
        .iter()
        .find(|i| i.name == name)
        .ok_or_else(|| SwapError::internal(format!("fake engine missing input '{name}'")))
}

/// Finds the bounding box of near-white pixels and emits one row whose
/// landmarks are the template fitted to that box.
///
/// A disc of width `w` is aligned so it spans half the crop, which makes the
/// aligned crop a fixed point of alignment.
#[derive(Debug, Default)]
pub struct FakeDetector {
    state: FakeState,
}

fake_common!(FakeDetector);

impl FakeDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InferenceEngine for FakeDetector {
    fn model_name(&self) -> &str {
        "fake-detector"
    }

    fn infer(&self, inputs: &[TensorInput<'_>]) -> SwapResult<ArrayD<f32>> {
        self.state.begin(self.model_name())?;
        let image = &input(inputs, "image")?.tensor;
        let (h, w) = (image.shape()[2], image.shape()[3]);

        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for y in 0..h {
            for x in 0..w {
                let bright = (0..3).all(|c| image[[0, c, y, x]] > 0.9);
                if bright {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    });
                }
            }
        }

        let Some((x0, y0, x1, y1)) = bounds else {
            return Ok(ArrayD::zeros(IxDyn(&[1, 0, DETECTION_ROW_LEN])));
        };
        let (x0, y0, x1, y1) = (x0 as f32, y0 as f32, x1 as f32 + 1.0, y1 as f32 + 1.0);
        let center = [(x0 + x1) / 2.0, (y0 + y1) / 2.0];
        let scale = ((x1 - x0) + (y1 - y0)) / 2.0 / 256.0;
        let n = FACE_TEMPLATE_512.len() as f32;
        let template_center = [
            FACE_TEMPLATE_512.iter().map(|p| p[0]).sum::<f32>() / n,
            FACE_TEMPLATE_512.iter().map(|p| p[1]).sum::<f32>() / n,
        ];

        let mut row = vec![x0, y0, x1, y1, 0.95];
        for p in FACE_TEMPLATE_512 {
            row.push(center[0] + (p[0] - template_center[0]) * scale);
            row.push(center[1] + (p[1] - template_center[1]) * scale);
        }
        Ok(ArrayD::from_shape_vec(IxDyn(&[1, 1, DETECTION_ROW_LEN]), row)?)
    }

    fn release(&self) {
        self.state.release();
    }
}

/// Coefficients derived from per-channel means of the input.
#[derive(Debug)]
pub struct FakeGeometry {
    state: FakeState,
    len: usize,
    nan_at: Option<usize>,
    cancel_on_infer: Mutex<Option<CancellationToken>>,
}

fake_common!(FakeGeometry);

impl FakeGeometry {
    pub fn new(len: usize) -> Self {
        Self {
            state: FakeState::default(),
            len,
            nan_at: None,
            cancel_on_infer: Mutex::new(None),
        }
    }

    /// Cancels `token` from inside the next forward pass, which still
    /// completes normally.
    pub fn cancel_during_infer(&self, token: &CancellationToken) {
        *self.cancel_on_infer.lock().unwrap() = Some(token.clone());
    }

    pub fn with_nan_at(len: usize, index: usize) -> Self {
        Self {
            nan_at: Some(index),
            ..Self::new(len)
        }
    }
}

impl InferenceEngine for FakeGeometry {
    fn model_name(&self) -> &str {
        "fake-geometry"
    }

    fn infer(&self, inputs: &[TensorInput<'_>]) -> SwapResult<ArrayD<f32>> {
        self.state.begin(self.model_name())?;
        let image = &input(inputs, "image")?.tensor;
        let plane = (image.shape()[2] * image.shape()[3]).max(1) as f32;
        let means: Vec<f32> = (0..3)
            .map(|c| {
                image
                    .index_axis(ndarray::Axis(1), c)
                    .iter()
                    .sum::<f32>()
                    / plane
            })
            .collect();
        let mut values: Vec<f32> = (0..self.len)
            .map(|i| means[i % 3] * (1.0 + i as f32 * 0.001) - 0.3)
            .collect();
        if let Some(index) = self.nan_at {
            values[index] = f32::NAN;
        }
        if let Some(token) = self.cancel_on_infer.lock().unwrap().take() {
            token.cancel();
        }
        Ok(Array2::from_shape_vec((1, self.len), values)?.into_dyn())
    }

    fn release(&self) {
        self.state.release();
    }
}

/// Draws a bright disc whose colour depends on the identity coefficients.
#[derive(Debug)]
pub struct FakeRenderer {
    state: FakeState,
    size: usize,
}

fake_common!(FakeRenderer);

impl FakeRenderer {
    pub fn new(size: u32) -> Self {
        Self {
            state: FakeState::default(),
            size: size as usize,
        }
    }
}

impl InferenceEngine for FakeRenderer {
    fn model_name(&self) -> &str {
        "fake-renderer"
    }

    fn infer(&self, inputs: &[TensorInput<'_>]) -> SwapResult<ArrayD<f32>> {
        self.state.begin(self.model_name())?;
        let coeffs = &input(inputs, "coeffs")?.tensor;
        let identity: Vec<f32> = coeffs.iter().take(80).copied().collect();
        let mean = identity.iter().sum::<f32>() / identity.len().max(1) as f32;
        let base = 0.7 + 0.2 * mean.tanh();
        let color = [base, base * 0.95, base * 0.9];

        let s = self.size as f32;
        let (cx, cy, r) = (s * 0.5, s * 0.6, s * 0.25);
        let out = Array4::from_shape_fn((1, 3, self.size, self.size), |(_, c, y, x)| {
            let (dx, dy) = (x as f32 - cx, y as f32 - cy);
            let unit = if dx * dx + dy * dy <= r * r { color[c] } else { 0.1 };
            unit * 2.0 - 1.0
        });
        Ok(out.into_dyn())
    }

    fn release(&self) {
        self.state.release();
    }
}

/// Labels pixels brighter than mid-grey as skin, everything else background.
#[derive(Debug)]
pub struct FakeParser {
    state: FakeState,
    size: usize,
}

fake_common!(FakeParser);

impl FakeParser {
    pub fn new(size: u32) -> Self {
        Self {
            state: FakeState::default(),
            size: size as usize,
        }
    }
}

impl InferenceEngine for FakeParser {
    fn model_name(&self) -> &str {
        "fake-parser"
    }

    fn infer(&self, inputs: &[TensorInput<'_>]) -> SwapResult<ArrayD<f32>> {
        self.state.begin(self.model_name())?;
        let image = &input(inputs, "image")?.tensor;
        let same_grid = image.shape()[2] == self.size && image.shape()[3] == self.size;
        let out = Array4::from_shape_fn(
            (1, NUM_PARSING_CLASSES, self.size, self.size),
            |(_, k, y, x)| {
                if !same_grid {
                    return 0.0;
                }
                let brightness = (0..3)
                    .map(|c| image[[0, c, y, x]] * IMAGENET_STD[c] + IMAGENET_MEAN[c])
                    .sum::<f32>()
                    / 3.0;
                let class = if brightness > 0.5 { 1 } else { 0 };
                if k == class { 1.0 } else { 0.0 }
            },
        );
        Ok(out.into_dyn())
    }

    fn release(&self) {
        self.state.release();
    }
}

/// Either copies `rendered` inside `rendered_mask` and `target` elsewhere, or
/// returns the negated target.
#[derive(Debug)]
pub struct FakeBlender {
    state: FakeState,
    size: usize,
    invert: bool,
}

fake_common!(FakeBlender);

impl FakeBlender {
    pub fn pass_through(size: u32) -> Self {
        Self {
            state: FakeState::default(),
            size: size as usize,
            invert: false,
        }
    }

    pub fn inverting(size: u32) -> Self {
        Self {
            invert: true,
            ..Self::pass_through(size)
        }
    }
}

impl InferenceEngine for FakeBlender {
    fn model_name(&self) -> &str {
        "fake-blender"
    }

    fn infer(&self, inputs: &[TensorInput<'_>]) -> SwapResult<ArrayD<f32>> {
        self.state.begin(self.model_name())?;
        let rendered = &input(inputs, "rendered")?.tensor;
        let target = &input(inputs, "target")?.tensor;
        let mask = &input(inputs, "rendered_mask")?.tensor;
        let out = Array4::from_shape_fn((1, 3, self.size, self.size), |(_, c, y, x)| {
            if self.invert {
                -target[[0, c, y, x]]
            } else if mask[[0, 0, y, x]] > 0.5 {
                rendered[[0, c, y, x]]
            } else {
                target[[0, c, y, x]]
            }
        });
        Ok(out.into_dyn())
    }

    fn release(&self) {
        self.state.release();
    }
}

/// One fake per model kind, kept typed so tests can read the counters.
#[derive(Debug, Clone)]
pub struct Fakes {
    pub detector: Arc<FakeDetector>,
    pub geometry: Arc<FakeGeometry>,
    pub renderer: Arc<FakeRenderer>,
    pub parser: Arc<FakeParser>,
    pub blender: Arc<FakeBlender>,
}

impl Fakes {
    pub fn new(config: &PipelineConfig) -> Self {
        let c = config.canonical_size;
        Self {
            detector: Arc::new(FakeDetector::new()),
            geometry: Arc::new(FakeGeometry::new(config.parameter_layout.len())),
            renderer: Arc::new(FakeRenderer::new(c)),
            parser: Arc::new(FakeParser::new(c)),
            blender: Arc::new(FakeBlender::pass_through(c)),
        }
    }

    pub fn engines(&self) -> Vec<(ModelKind, Arc<dyn InferenceEngine>)> {
        vec![
            (ModelKind::Detector, self.detector.clone() as Arc<dyn InferenceEngine>),
            (ModelKind::Geometry, self.geometry.clone() as Arc<dyn InferenceEngine>),
            (ModelKind::Renderer, self.renderer.clone() as Arc<dyn InferenceEngine>),
            (ModelKind::Parser, self.parser.clone() as Arc<dyn InferenceEngine>),
            (ModelKind::Blender, self.blender.clone() as Arc<dyn InferenceEngine>),
        ]
    }

    /// Builds a registry and zeroes the counters the canaries bumped.
    pub fn registry(&self, config: &PipelineConfig) -> ModelRegistry {
        let registry =
            ModelRegistry::from_engines(self.engines(), config).expect("fake registry loads");
        self.reset_calls();
        registry
    }

    pub fn reset_calls(&self) {
        self.detector.reset_calls();
        self.geometry.reset_calls();
        self.renderer.reset_calls();
        self.parser.reset_calls();
        self.blender.reset_calls();
    }
}
