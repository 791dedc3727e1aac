//! Per-request options.

use headswap_core::utils::OutputFormat;
use serde::{Deserialize, Serialize};

/// How a single swap request should be processed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapOptions {
    /// Detect and align both faces. When false both inputs must already be
    /// canonical crops.
    pub crop_align: bool,
    /// Paste the result back into the full target frame. When false the
    /// blended crop is returned.
    pub full_frame: bool,
    /// Return `[source | target | result]` side by side.
    pub side_by_side: bool,
    /// Encoding used at the service boundary.
    pub output_format: OutputFormat,
}

impl Default for SwapOptions {
    fn default() -> Self {
        Self {
            crop_align: true,
            full_frame: true,
            side_by_side: false,
            output_format: OutputFormat::default(),
        }
    }
}

impl SwapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crop_align(mut self, crop_align: bool) -> Self {
        self.crop_align = crop_align;
        self
    }

    pub fn with_full_frame(mut self, full_frame: bool) -> Self {
        self.full_frame = full_frame;
        self
    }

    pub fn with_side_by_side(mut self, side_by_side: bool) -> Self {
        self.side_by_side = side_by_side;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }
}
