//! The per-request state machine.

use headswap_core::core::{ProcessingStage, SwapError, SwapResult};
use std::fmt;

/// Where a request is in the stage sequence.
///
/// `Done` and `Failed` are terminal. `Failed` carries the stable reason code of
/// the error that ended the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    SourceAligning,
    TargetAligning,
    GeometryEstimating,
    Rendering,
    Segmenting,
    Blending,
    Compositing,
    Done,
    Failed(&'static str),
}

/// Something that happened while a request was in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    RequestReceived,
    SourceAligned,
    SourceNoFace,
    TargetAligned,
    TargetNoFace,
    GeometryEstimated,
    GeometryFailed,
    Rendered,
    Segmented,
    Blended,
    /// Blending finished and the caller asked for the crop only.
    CompositingSkipped,
    Composited,
    /// Unrecoverable failure (model execution, cancellation, bad input) with its
    /// reason code.
    Abort(&'static str),
}

impl PipelineState {
    /// Applies `event`.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Internal`] for a pair the table does not allow,
    /// including any event delivered to a terminal state.
    pub fn on(self, event: PipelineEvent) -> SwapResult<PipelineState> {
        use PipelineEvent as E;
        use PipelineState as S;

        let next = match (self, event) {
            (S::Idle, E::RequestReceived) => S::SourceAligning,
            (S::SourceAligning, E::SourceAligned) => S::TargetAligning,
            (S::SourceAligning, E::SourceNoFace) => S::Failed("no_face_source"),
            (S::TargetAligning, E::TargetAligned) => S::GeometryEstimating,
            (S::TargetAligning, E::TargetNoFace) => S::Failed("no_face_target"),
            (S::GeometryEstimating, E::GeometryEstimated) => S::Rendering,
            (S::GeometryEstimating, E::GeometryFailed) => S::Failed("geometry_error"),
            (S::Rendering, E::Rendered) => S::Segmenting,
            (S::Segmenting, E::Segmented) => S::Blending,
            (S::Blending, E::Blended) => S::Compositing,
            (S::Blending, E::CompositingSkipped) => S::Done,
            (S::Compositing, E::Composited) => S::Done,
            (state, E::Abort(code)) if !state.is_terminal() => S::Failed(code),
            (state, event) => {
                return Err(SwapError::internal(format!(
                    "illegal pipeline transition: {state} on {event:?}"
                )));
            }
        };
        Ok(next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }

    /// The reason code when failed.
    pub fn failure_code(&self) -> Option<&'static str> {
        match self {
            PipelineState::Failed(code) => Some(*code),
            _ => None,
        }
    }

    /// The processing stage that runs while in this state.
    pub fn stage(&self) -> Option<ProcessingStage> {
        match self {
            PipelineState::Idle => Some(ProcessingStage::Decode),
            PipelineState::SourceAligning | PipelineState::TargetAligning => {
                Some(ProcessingStage::Alignment)
            }
            PipelineState::GeometryEstimating => Some(ProcessingStage::GeometryEstimation),
            PipelineState::Rendering => Some(ProcessingStage::Rendering),
            PipelineState::Segmenting => Some(ProcessingStage::Segmentation),
            PipelineState::Blending => Some(ProcessingStage::Blending),
            PipelineState::Compositing => Some(ProcessingStage::Compositing),
            PipelineState::Done | PipelineState::Failed(_) => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::SourceAligning => f.write_str("source_aligning"),
            PipelineState::TargetAligning => f.write_str("target_aligning"),
            PipelineState::GeometryEstimating => f.write_str("geometry_estimating"),
            PipelineState::Rendering => f.write_str("rendering"),
            PipelineState::Segmenting => f.write_str("segmenting"),
            PipelineState::Blending => f.write_str("blending"),
            PipelineState::Compositing => f.write_str("compositing"),
            PipelineState::Done => f.write_str("done"),
            PipelineState::Failed(code) => write!(f, "failed({code})"),
        }
    }
}
