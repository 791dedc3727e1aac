//! Transport-agnostic request handling.
//!
//! [`SwapService`] is what an HTTP handler would call: it runs the pipeline,
//! encodes the result and turns failures into [`ClientError`]s. Uploads that
//! must touch disk go through [`UploadSpool`], whose files never outlive the
//! request.

mod response;
mod spool;

pub use response::{ClientError, HealthStatus};
pub use spool::{SpooledUpload, UploadSpool};

use crate::pipeline::{
    CancellationToken, InferencePipeline, PipelineReport, PipelineStats, SwapOptions,
};
use headswap_core::utils::encode_image;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// An encoded swap result.
#[derive(Debug, Clone)]
pub struct SwapResponse {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub report: PipelineReport,
}

/// One independent request for [`SwapService::process_many`].
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub source: Vec<u8>,
    pub target: Vec<u8>,
    pub options: SwapOptions,
}

/// Runs requests against a shared pipeline.
#[derive(Debug, Clone)]
pub struct SwapService {
    pipeline: Arc<InferencePipeline>,
}

impl SwapService {
    pub fn new(pipeline: Arc<InferencePipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Arc<InferencePipeline> {
        &self.pipeline
    }

    /// Swaps and encodes one request.
    pub fn handle(
        &self,
        source: &[u8],
        target: &[u8],
        options: &SwapOptions,
    ) -> Result<SwapResponse, ClientError> {
        self.handle_with(source, target, options, &CancellationToken::new())
    }

    pub fn handle_with(
        &self,
        source: &[u8],
        target: &[u8],
        options: &SwapOptions,
        token: &CancellationToken,
    ) -> Result<SwapResponse, ClientError> {
        let outcome = self.pipeline.run_with(source, target, options, token);
        let image = outcome.result.map_err(ClientError::from)?;
        let bytes = encode_image(&image, options.output_format)?;
        debug!(
            request = outcome.report.request_id,
            bytes = bytes.len(),
            format = options.output_format.extension(),
            "result encoded"
        );
        Ok(SwapResponse {
            bytes,
            mime_type: options.output_format.mime_type(),
            width: image.width(),
            height: image.height(),
            report: outcome.report,
        })
    }

    /// Spools both uploads to disk, then processes them.
    ///
    /// The spooled files are removed before this returns, whatever the result.
    pub fn handle_uploads(
        &self,
        spool: &UploadSpool,
        source: &[u8],
        target: &[u8],
        options: &SwapOptions,
    ) -> Result<SwapResponse, ClientError> {
        let source_file = spool.spool("source", source)?;
        let target_file = spool.spool("target", target)?;
        self.handle(&source_file.read()?, &target_file.read()?, options)
    }

    /// Processes independent requests in parallel; results keep request order.
    pub fn process_many(&self, requests: &[SwapRequest]) -> Vec<Result<SwapResponse, ClientError>> {
        requests
            .par_iter()
            .map(|request| self.handle(&request.source, &request.target, &request.options))
            .collect()
    }

    pub fn stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fakes, portrait_with_face, small_config};
    use headswap_core::utils::{OutputFormat, decode_image};

    fn service() -> SwapService {
        let config = small_config();
        let registry = Fakes::new(&config).registry(&config);
        SwapService::new(Arc::new(InferencePipeline::new(&registry)))
    }

    fn png(width: u32, height: u32, face: Option<(i32, i32, i32)>) -> Vec<u8> {
        let image = match face {
            Some((x, y, r)) => portrait_with_face(width, height, (x, y), r),
            None => headswap_core::domain::RawImage::filled(width, height, [0, 0, 0]),
        };
        encode_image(&image, OutputFormat::Png).unwrap()
    }

    #[test]
    fn test_handle_encodes_requested_format() {
        let service = service();
        let options = SwapOptions::default().with_output_format(OutputFormat::Jpeg { quality: 85 });
        let response = service
            .handle(
                &png(160, 200, Some((80, 90, 36))),
                &png(200, 240, Some((100, 120, 44))),
                &options,
            )
            .unwrap();
        assert_eq!(response.mime_type, "image/jpeg");
        assert_eq!((response.width, response.height), (200, 240));
        let decoded = decode_image(&response.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (200, 240));
    }

    #[test]
    fn test_handle_maps_failures() {
        let service = service();
        let err = service
            .handle(
                &png(100, 100, None),
                &png(200, 240, Some((100, 120, 44))),
                &SwapOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.code, "no_face_source");
        assert_eq!(err.status, 400);
    }

    #[test]
    fn test_uploads_are_removed_after_handling() {
        let service = service();
        let dir = tempfile::tempdir().unwrap();
        let spool = UploadSpool::new(dir.path()).unwrap();
        let result = service.handle_uploads(
            &spool,
            &png(160, 200, Some((80, 90, 36))),
            b"garbage",
            &SwapOptions::default(),
        );
        assert_eq!(result.unwrap_err().code, "invalid_input");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_process_many_keeps_order_and_counts() {
        let service = service();
        let good = SwapRequest {
            source: png(160, 200, Some((80, 90, 36))),
            target: png(200, 240, Some((100, 120, 44))),
            options: SwapOptions::default(),
        };
        let bad = SwapRequest {
            target: png(90, 90, None),
            ..good.clone()
        };
        let results = service.process_many(&[good.clone(), bad, good]);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().code, "no_face_target");
        assert!(results[2].is_ok());

        let stats = service.stats();
        assert_eq!(stats.total_processed, 3);
        assert_eq!(stats.failures("no_face_target"), 1);
    }
}
