//! Runs one swap request through the stage sequence.

use super::cancel::CancellationToken;
use super::options::SwapOptions;
use super::state::{PipelineEvent, PipelineState};
use super::stats::{PipelineStats, StatsManager};
use crate::models::{Blender, FaceAligner, FaceParser, GeometryEstimator, Renderer};
use crate::processors::Compositor;
use crate::registry::ModelRegistry;
use headswap_core::core::{ImageRole, ProcessingStage, SwapError, SwapResult};
use headswap_core::domain::{AlignedFace, ModelKind, RawImage};
use headswap_core::utils::{concat_horizontal, decode_image};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

/// What happened during one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Process-unique request number.
    pub request_id: u64,
    /// Every state visited, starting with `Idle`.
    pub states: Vec<PipelineState>,
    /// Wall time per executed stage, in execution order.
    pub stage_timings: Vec<(ProcessingStage, Duration)>,
    /// True when the crop was returned without pasting it into the frame.
    pub compositing_skipped: bool,
    /// Wall time of the whole request.
    pub total: Duration,
}

impl PipelineReport {
    fn new(request_id: u64) -> Self {
        Self {
            request_id,
            states: vec![PipelineState::Idle],
            stage_timings: Vec::new(),
            compositing_skipped: false,
            total: Duration::ZERO,
        }
    }

    /// The terminal state of the request.
    pub fn final_state(&self) -> PipelineState {
        self.states
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }

    /// Total time spent in `stage`.
    pub fn stage_time(&self, stage: ProcessingStage) -> Duration {
        self.stage_timings
            .iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, d)| *d)
            .sum()
    }

    /// True when `state` was visited.
    pub fn visited(&self, state: PipelineState) -> bool {
        self.states.contains(&state)
    }
}

/// Result image or failure, plus the report.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub result: SwapResult<RawImage>,
    pub report: PipelineReport,
}

impl PipelineOutcome {
    pub fn into_result(self) -> SwapResult<RawImage> {
        self.result
    }
}

/// Book-keeping for one request: current state, report and cancellation.
struct Execution<'a> {
    state: PipelineState,
    report: PipelineReport,
    token: &'a CancellationToken,
    started: Instant,
}

impl<'a> Execution<'a> {
    fn new(request_id: u64, token: &'a CancellationToken) -> Self {
        Self {
            state: PipelineState::Idle,
            report: PipelineReport::new(request_id),
            token,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, event: PipelineEvent) -> SwapResult<()> {
        self.state = self.state.on(event)?;
        self.report.states.push(self.state);
        Ok(())
    }

    /// Runs one stage after checking for cancellation, recording its time.
    fn stage<T>(
        &mut self,
        stage: ProcessingStage,
        f: impl FnOnce() -> SwapResult<T>,
    ) -> SwapResult<T> {
        self.token.check(stage)?;
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        self.report.stage_timings.push((stage, elapsed));
        debug!(
            stage = %stage,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            ok = result.is_ok(),
            "stage finished"
        );
        result
    }

    fn finish(mut self, result: SwapResult<RawImage>) -> PipelineOutcome {
        if let Err(err) = &result {
            // Abort is accepted from every non-terminal state.
            if let Ok(next) = self.state.on(PipelineEvent::Abort(err.code())) {
                self.state = next;
                self.report.states.push(next);
            }
        }
        self.report.total = self.started.elapsed();
        PipelineOutcome {
            result,
            report: self.report,
        }
    }
}

/// The staged swap pipeline.
///
/// Holds one adapter per model plus the compositor. Shared across threads as
/// `Arc<InferencePipeline>`; requests never share mutable state.
#[derive(Debug)]
pub struct InferencePipeline {
    aligner: FaceAligner,
    geometry: GeometryEstimator,
    renderer: Renderer,
    parser: FaceParser,
    blender: Blender,
    compositor: Compositor,
    next_request: AtomicU64,
    stats: StatsManager,
}

impl InferencePipeline {
    /// Builds the stage adapters from a loaded registry.
    pub fn new(registry: &ModelRegistry) -> Self {
        let config = registry.pipeline_config();
        Self {
            aligner: FaceAligner::new(registry.get(ModelKind::Detector), config),
            geometry: GeometryEstimator::new(registry.get(ModelKind::Geometry), config),
            renderer: Renderer::new(registry.get(ModelKind::Renderer), config),
            parser: FaceParser::new(registry.get(ModelKind::Parser), config),
            blender: Blender::new(registry.get(ModelKind::Blender), config),
            compositor: Compositor::new(config.feather_px),
            next_request: AtomicU64::new(1),
            stats: StatsManager::new(),
        }
    }

    /// Swaps the identity of `source_bytes` onto `target_bytes`.
    pub fn run(
        &self,
        source_bytes: &[u8],
        target_bytes: &[u8],
        options: &SwapOptions,
    ) -> SwapResult<RawImage> {
        self.run_with(source_bytes, target_bytes, options, &CancellationToken::new())
            .into_result()
    }

    /// Like [`InferencePipeline::run`], observing `token` and returning the
    /// report.
    pub fn run_with(
        &self,
        source_bytes: &[u8],
        target_bytes: &[u8],
        options: &SwapOptions,
        token: &CancellationToken,
    ) -> PipelineOutcome {
        self.execute(options, token, |exec| {
            exec.stage(ProcessingStage::Decode, || {
                Ok((decode_image(source_bytes)?, decode_image(target_bytes)?))
            })
        })
    }

    /// Runs on already decoded images.
    pub fn run_images(
        &self,
        source: &RawImage,
        target: &RawImage,
        options: &SwapOptions,
        token: &CancellationToken,
    ) -> PipelineOutcome {
        self.execute(options, token, |_| Ok((source.clone(), target.clone())))
    }

    /// Snapshot of the counters over every finished request.
    pub fn stats(&self) -> PipelineStats {
        self.stats.get_stats()
    }

    fn execute<F>(&self, options: &SwapOptions, token: &CancellationToken, inputs: F) -> PipelineOutcome
    where
        F: FnOnce(&mut Execution<'_>) -> SwapResult<(RawImage, RawImage)>,
    {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("swap", request = request_id);
        let _guard = span.enter();

        let mut exec = Execution::new(request_id, token);
        let result = inputs(&mut exec)
            .and_then(|(source, target)| self.swap(&mut exec, &source, &target, options));
        let outcome = exec.finish(result);

        let report = &outcome.report;
        let latency_ms = report.total.as_secs_f64() * 1000.0;
        match &outcome.result {
            Ok(image) => info!(
                width = image.width(),
                height = image.height(),
                elapsed_ms = latency_ms,
                "swap request finished"
            ),
            Err(err) if err.is_user_correctable() => warn!(
                state = %report.final_state(),
                code = err.code(),
                "swap request rejected"
            ),
            Err(SwapError::Cancelled { stage }) => {
                info!(stage = %stage, "swap request cancelled")
            }
            Err(err) => error!(
                state = %report.final_state(),
                code = err.code(),
                error = %err,
                "swap request failed"
            ),
        }
        self.stats.record(
            outcome.result.as_ref().err().map(SwapError::code),
            latency_ms,
        );
        outcome
    }

    fn align(&self, image: &RawImage, options: &SwapOptions) -> SwapResult<Option<AlignedFace>> {
        if options.crop_align {
            self.aligner.align(image)
        } else {
            self.aligner.align_canonical(image).map(Some)
        }
    }

    fn swap(
        &self,
        exec: &mut Execution<'_>,
        source: &RawImage,
        target: &RawImage,
        options: &SwapOptions,
    ) -> SwapResult<RawImage> {
        exec.advance(PipelineEvent::RequestReceived)?;

        let source_face = exec.stage(ProcessingStage::Alignment, || self.align(source, options))?;
        let Some(source_face) = source_face else {
            exec.advance(PipelineEvent::SourceNoFace)?;
            return Err(SwapError::NoFaceDetected {
                role: ImageRole::Source,
            });
        };
        exec.advance(PipelineEvent::SourceAligned)?;

        let target_face = exec.stage(ProcessingStage::Alignment, || self.align(target, options))?;
        let Some(target_face) = target_face else {
            exec.advance(PipelineEvent::TargetNoFace)?;
            return Err(SwapError::NoFaceDetected {
                role: ImageRole::Target,
            });
        };
        exec.advance(PipelineEvent::TargetAligned)?;

        let geometry = exec.stage(ProcessingStage::GeometryEstimation, || {
            let s = self
                .geometry
                .estimate(&source_face)
                .map_err(|e| e.with_role(ImageRole::Source))?;
            let t = self
                .geometry
                .estimate(&target_face)
                .map_err(|e| e.with_role(ImageRole::Target))?;
            Ok((s, t))
        });
        let (source_params, target_params) = match geometry {
            Ok(params) => params,
            Err(err @ SwapError::GeometryError { .. }) => {
                exec.advance(PipelineEvent::GeometryFailed)?;
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        exec.advance(PipelineEvent::GeometryEstimated)?;

        let rendered = exec.stage(ProcessingStage::Rendering, || {
            self.renderer.render(&source_params, &target_params)
        })?;
        exec.advance(PipelineEvent::Rendered)?;

        let (rendered_mask, target_mask) = exec.stage(ProcessingStage::Segmentation, || {
            Ok((
                self.parser.segment_image(&rendered)?,
                self.parser.segment(&target_face)?,
            ))
        })?;
        exec.advance(PipelineEvent::Segmented)?;

        let (blended, region) = exec.stage(ProcessingStage::Blending, || {
            let region = self.blender.editable_region(&rendered_mask, &target_mask);
            let blended =
                self.blender
                    .blend(&rendered, &target_face, &rendered_mask, &target_mask)?;
            Ok((blended, region))
        })?;

        let output = if options.full_frame {
            exec.advance(PipelineEvent::Blended)?;
            let pasted = exec.stage(ProcessingStage::Compositing, || {
                self.compositor
                    .paste_masked(&blended, target, target_face.transform(), &region)
            })?;
            exec.advance(PipelineEvent::Composited)?;
            pasted
        } else {
            exec.advance(PipelineEvent::CompositingSkipped)?;
            exec.report.compositing_skipped = true;
            blended
        };

        if options.side_by_side {
            return concat_horizontal(&[source, target, &output], target.height());
        }
        Ok(output)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
