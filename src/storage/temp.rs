use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::storage::clips::{short_token, unix_seconds};

/// An uploaded video persisted to the temp directory for the lifetime of
/// one analysis request.
///
/// The file is removed when the guard drops. That covers success, handled
/// failure, and panics unwinding out of the pipeline.
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub fn create(temp_dir: &Path, bytes: &[u8]) -> Result<Self> {
        fs::create_dir_all(temp_dir)
            .with_context(|| format!("Failed to create temp directory {:?}", temp_dir))?;

        let name = format!("{}_{}.mp4", unix_seconds(), short_token());
        let path = temp_dir.join(name);
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to persist upload to {:?}", path))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove temp upload {:?}: {}", self.path, e);
            }
        }
    }
}
