use headswap_core::core::{ProcessingStage, SwapError, SwapResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a caller and a running request.
///
/// The pipeline checks it before every stage; a model invocation already in
/// flight always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`SwapError::Cancelled`] naming `stage` once cancelled.
    pub fn check(&self, stage: ProcessingStage) -> SwapResult<()> {
        if self.is_cancelled() {
            return Err(SwapError::Cancelled { stage });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check(ProcessingStage::Rendering).is_ok());
        clone.cancel();
        let err = token.check(ProcessingStage::Rendering).unwrap_err();
        assert_eq!(err.code(), "cancelled");
        assert!(err.to_string().contains("rendering"));
    }
}
