//! On-disk copies of in-memory uploads for libraries that only open paths.
use crate::error::{ParseError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A buffer written to a private scratch directory.
///
/// The file and its directory are removed when the guard drops, on success
/// and failure alike. Removal errors are logged and swallowed so they never
/// replace the extraction error being returned.
pub struct ScratchFile {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchFile {
    pub fn write(data: &[u8], file_name: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("docingest-")
            .tempdir()
            .map_err(|e| ParseError::internal("create scratch directory", e))?;
        let path = dir.path().join(file_name);
        fs::write(&path, data).map_err(|e| ParseError::internal("write scratch file", e))?;
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), "Failed to remove scratch file: {err}");
        }
        if let Some(dir) = self.dir.take() {
            let dir_path = dir.path().to_path_buf();
            if let Err(err) = dir.close() {
                tracing::warn!(path = %dir_path.display(), "Failed to remove scratch directory: {err}");
            }
        }
    }
}
