//! Scoped on-disk copies of uploaded images.

use headswap_core::core::SwapResult;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Directory that receives uploads for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadSpool {
    dir: PathBuf,
}

impl UploadSpool {
    /// Uses `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> SwapResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Uses the system temporary directory.
    pub fn in_temp_dir() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `bytes` to a fresh file; the file is removed when the returned
    /// guard is dropped, including during unwinding.
    pub fn spool(&self, label: &str, bytes: &[u8]) -> SwapResult<SpooledUpload> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{label}-"))
            .suffix(".upload")
            .tempfile_in(&self.dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        debug!(path = %file.path().display(), bytes = bytes.len(), "upload spooled");
        Ok(SpooledUpload { file })
    }
}

/// One spooled upload. Deleted on drop.
#[derive(Debug)]
pub struct SpooledUpload {
    file: NamedTempFile,
}

impl SpooledUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> SwapResult<Vec<u8>> {
        Ok(fs::read(self.path())?)
    }
}
