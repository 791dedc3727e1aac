use super::*;
use crate::models::FaceAligner;
use crate::processors::Compositor;
use crate::test_support::{FakeGeometry, Fakes, portrait_with_face, small_config};
use headswap_core::utils::{OutputFormat, encode_image};
use image::{Rgb, RgbImage};
use std::sync::Arc;

fn png(image: &RawImage) -> Vec<u8> {
    encode_image(image, OutputFormat::Png).unwrap()
}

fn source_frame() -> RawImage {
    portrait_with_face(160, 200, (80, 90), 36)
}

fn target_frame() -> RawImage {
    portrait_with_face(220, 260, (120, 130), 48)
}

fn pipeline() -> (InferencePipeline, Fakes) {
    let config = small_config();
    let fakes = Fakes::new(&config);
    let registry = fakes.registry(&config);
    (InferencePipeline::new(&registry), fakes)
}

fn run(pipeline: &InferencePipeline, source: &RawImage, target: &RawImage) -> PipelineOutcome {
    pipeline.run_with(
        &png(source),
        &png(target),
        &SwapOptions::default(),
        &CancellationToken::new(),
    )
}

#[test]
fn test_valid_pair_reaches_done_with_target_dimensions() {
    let (pipeline, fakes) = pipeline();
    let target = target_frame();
    let outcome = run(&pipeline, &source_frame(), &target);

    let image = outcome.result.unwrap();
    assert_eq!(image.dimensions(), target.dimensions());
    assert_eq!(outcome.report.final_state(), PipelineState::Done);
    assert!(outcome.report.visited(PipelineState::Compositing));
    assert_eq!(fakes.detector.calls(), 2);
    assert_eq!(fakes.geometry.calls(), 2);
    assert_eq!(fakes.renderer.calls(), 1);
    assert_eq!(fakes.parser.calls(), 2);
    assert_eq!(fakes.blender.calls(), 1);
}

#[test]
fn test_state_sequence_is_recorded() {
    let (pipeline, _) = pipeline();
    let outcome = run(&pipeline, &source_frame(), &target_frame());
    assert_eq!(
        outcome.report.states,
        vec![
            PipelineState::Idle,
            PipelineState::SourceAligning,
            PipelineState::TargetAligning,
            PipelineState::GeometryEstimating,
            PipelineState::Rendering,
            PipelineState::Segmenting,
            PipelineState::Blending,
            PipelineState::Compositing,
            PipelineState::Done,
        ]
    );
    assert_eq!(outcome.report.stage_timings.len(), 8);
    assert!(outcome.report.total >= outcome.report.stage_time(ProcessingStage::Alignment));
}

#[test]
fn test_no_face_in_source_skips_downstream_models() {
    let (pipeline, fakes) = pipeline();
    let blank = RawImage::filled(160, 200, [40, 90, 160]);
    let outcome = run(&pipeline, &blank, &target_frame());

    let err = outcome.result.unwrap_err();
    assert_eq!(err.code(), "no_face_source");
    assert_eq!(
        outcome.report.final_state(),
        PipelineState::Failed("no_face_source")
    );
    assert_eq!(fakes.detector.calls(), 1);
    assert_eq!(fakes.geometry.calls(), 0);
    assert_eq!(fakes.renderer.calls(), 0);
    assert_eq!(fakes.blender.calls(), 0);
}

#[test]
fn test_landscape_source_without_face() {
    let (pipeline, fakes) = pipeline();
    let landscape = RawImage::filled(320, 180, [60, 120, 60]);
    let outcome = run(&pipeline, &landscape, &target_frame());
    assert_eq!(
        outcome.report.final_state(),
        PipelineState::Failed("no_face_source")
    );
    assert_eq!(fakes.renderer.calls(), 0);
}

#[test]
fn test_no_face_in_target() {
    let (pipeline, fakes) = pipeline();
    let blank = RawImage::filled(100, 100, [10, 10, 10]);
    let outcome = run(&pipeline, &source_frame(), &blank);
    assert_eq!(outcome.result.unwrap_err().code(), "no_face_target");
    assert_eq!(fakes.geometry.calls(), 0);
}

#[test]
fn test_pasted_crop_is_recovered_by_realignment() {
    let config = small_config();
    let fakes = Fakes::new(&config);
    let registry = fakes.registry(&config);
    let aligner = FaceAligner::new(registry.get(ModelKind::Detector), &config);
    let frame = target_frame();
    let face = aligner.align(&frame).unwrap().unwrap();

    // Keep the bright face, repaint everything else with a smooth gradient.
    let size = face.size();
    let blended = RawImage::new(RgbImage::from_fn(size, size, |x, y| {
        let p = face.image().pixel(x, y);
        if p.iter().all(|&v| v > 200) {
            Rgb([255, 255, 255])
        } else {
            Rgb([(60 + x / 2) as u8, (80 + y / 2) as u8, 120])
        }
    }));

    let pasted = Compositor::new(config.feather_px)
        .paste(&blended, &frame, face.transform())
        .unwrap();
    let again = aligner.align(&pasted).unwrap().unwrap();
    assert!(
        (again.transform().scale() / face.transform().scale() - 1.0).abs() < 0.05,
        "scale {} vs {}",
        again.transform().scale(),
        face.transform().scale()
    );

    let margin = 2 * config.feather_px;
    let mut total = 0u64;
    let mut close = 0usize;
    let mut count = 0usize;
    for y in margin..size - margin {
        for x in margin..size - margin {
            let a = blended.pixel(x, y);
            let b = again.image().pixel(x, y);
            let diff = (0..3)
                .map(|c| (a[c] as i32 - b[c] as i32).unsigned_abs())
                .max()
                .unwrap_or(0);
            total += u64::from(diff);
            close += usize::from(diff <= 24);
            count += 1;
        }
    }
    let mean = total as f64 / count as f64;
    assert!(mean < 8.0, "mean difference {mean}");
    assert!(close as f64 / count as f64 > 0.9, "{close}/{count} pixels close");
}

#[test]
fn test_full_frame_keeps_target_background() {
    let (pipeline, _) = pipeline();
    let target = target_frame();
    let output = run(&pipeline, &source_frame(), &target).result.unwrap();

    for (x, y) in [(0, 0), (219, 0), (0, 259), (219, 259), (10, 130)] {
        assert_eq!(output.pixel(x, y), target.pixel(x, y), "pixel ({x}, {y})");
    }
    // The face itself changed.
    assert_ne!(output.pixel(120, 130), target.pixel(120, 130));
}

#[test]
fn test_crop_only_skips_compositing() {
    let (pipeline, _) = pipeline();
    let options = SwapOptions::default().with_full_frame(false);
    let outcome = pipeline.run_images(
        &source_frame(),
        &target_frame(),
        &options,
        &CancellationToken::new(),
    );
    let size = small_config().canonical_size;
    assert_eq!(outcome.result.unwrap().dimensions(), (size, size));
    assert!(outcome.report.compositing_skipped);
    assert!(!outcome.report.visited(PipelineState::Compositing));
    assert_eq!(outcome.report.final_state(), PipelineState::Done);
}

#[test]
fn test_alignment_free_mode() {
    let (pipeline, fakes) = pipeline();
    let size = small_config().canonical_size;
    let crop = portrait_with_face(size, size, (64, 77), 32);
    let options = SwapOptions::default().with_crop_align(false);
    let outcome = pipeline.run_images(&crop, &crop, &options, &CancellationToken::new());
    assert_eq!(outcome.result.unwrap().dimensions(), (size, size));
    assert_eq!(fakes.detector.calls(), 0);

    let err = pipeline
        .run_images(&target_frame(), &crop, &options, &CancellationToken::new())
        .into_result()
        .unwrap_err();
    assert_eq!(err.code(), "invalid_input");
}

#[test]
fn test_side_by_side_output() {
    let (pipeline, _) = pipeline();
    let source = source_frame();
    let target = target_frame();
    let options = SwapOptions::default().with_side_by_side(true);
    let image = pipeline
        .run(&png(&source), &png(&target), &options)
        .unwrap();
    assert_eq!(image.height(), target.height());
    // Source is resized to the target height: 160 * 260 / 200 = 208.
    assert_eq!(image.width(), 208 + 220 + 220);
}

#[test]
fn test_geometry_fault_is_reported_with_role() {
    let config = small_config();
    let mut fakes = Fakes::new(&config);
    fakes.geometry = Arc::new(FakeGeometry::with_nan_at(config.parameter_layout.len(), 3));
    let pipeline = InferencePipeline::new(&fakes.registry(&config));

    let outcome = run(&pipeline, &source_frame(), &target_frame());
    let err = outcome.result.unwrap_err();
    assert_eq!(err.code(), "geometry_error");
    assert!(err.to_string().contains("source face"));
    assert_eq!(
        outcome.report.final_state(),
        PipelineState::Failed("geometry_error")
    );
    assert_eq!(fakes.renderer.calls(), 0);
}

#[test]
fn test_cancellation_before_start() {
    let (pipeline, fakes) = pipeline();
    let token = CancellationToken::new();
    token.cancel();
    let outcome = pipeline.run_with(
        &png(&source_frame()),
        &png(&target_frame()),
        &SwapOptions::default(),
        &token,
    );
    assert!(matches!(
        outcome.result,
        Err(SwapError::Cancelled {
            stage: ProcessingStage::Decode
        })
    ));
    assert_eq!(outcome.report.final_state(), PipelineState::Failed("cancelled"));
    assert_eq!(fakes.detector.calls(), 0);
}

#[test]
fn test_cancellation_between_stages_lets_running_model_finish() {
    let (pipeline, fakes) = pipeline();
    let token = CancellationToken::new();
    fakes.geometry.cancel_during_infer(&token);

    let outcome = pipeline.run_with(
        &png(&source_frame()),
        &png(&target_frame()),
        &SwapOptions::default(),
        &token,
    );
    assert!(matches!(
        outcome.result,
        Err(SwapError::Cancelled {
            stage: ProcessingStage::Rendering
        })
    ));
    assert_eq!(outcome.report.final_state(), PipelineState::Failed("cancelled"));
    assert!(outcome.report.visited(PipelineState::Rendering));
    // The geometry stage runs to completion for both faces.
    assert_eq!(fakes.geometry.calls(), 2);
    assert_eq!(fakes.renderer.calls(), 0);
    assert_eq!(fakes.parser.calls(), 0);
    assert_eq!(fakes.blender.calls(), 0);
}

#[test]
fn test_undecodable_bytes() {
    let (pipeline, _) = pipeline();
    let outcome = pipeline.run_with(
        b"not an image",
        &png(&target_frame()),
        &SwapOptions::default(),
        &CancellationToken::new(),
    );
    assert_eq!(outcome.result.unwrap_err().code(), "invalid_input");
    assert_eq!(
        outcome.report.states,
        vec![PipelineState::Idle, PipelineState::Failed("invalid_input")]
    );
}

#[test]
fn test_concurrent_requests_match_sequential_results() {
    let (pipeline, _) = pipeline();
    let pipeline = Arc::new(pipeline);
    let inputs: Vec<(Vec<u8>, Vec<u8>)> = (0..6)
        .map(|i| {
            let source = portrait_with_face(160, 200, (70 + i * 4, 90), 30 + i);
            (png(&source), png(&target_frame()))
        })
        .collect();

    let sequential: Vec<RawImage> = inputs
        .iter()
        .map(|(s, t)| pipeline.run(s, t, &SwapOptions::default()).unwrap())
        .collect();

    let concurrent: Vec<RawImage> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|(s, t)| {
                let pipeline = Arc::clone(&pipeline);
                scope.spawn(move || pipeline.run(s, t, &SwapOptions::default()).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
}

#[test]
fn test_stats_track_outcomes() {
    let (pipeline, _) = pipeline();
    run(&pipeline, &source_frame(), &target_frame()).result.unwrap();
    let _ = run(&pipeline, &RawImage::filled(50, 50, [0, 0, 0]), &target_frame());
    let stats = pipeline.stats();
    assert_eq!(stats.total_processed, 2);
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.failures("no_face_source"), 1);
}

#[test]
fn test_requests_after_shutdown_fail_with_model_execution() {
    let config = small_config();
    let fakes = Fakes::new(&config);
    let registry = fakes.registry(&config);
    let pipeline = InferencePipeline::new(&registry);
    let report = registry.shutdown();
    assert_eq!(report.released.len(), 5);
    assert!(fakes.detector.is_released());

    let err = run(&pipeline, &source_frame(), &target_frame())
        .result
        .unwrap_err();
    assert_eq!(err.code(), "model_execution_error");
}
