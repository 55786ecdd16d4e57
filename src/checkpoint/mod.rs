//! Checkpoint Store
//!
//! Write-only sink of named blobs under one flat directory per manager
//! instance. Every write replaces the whole file; the store never reads back
//! what it wrote and keeps no record of which files exist.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("Invalid checkpoint filename '{filename}': {reason}")]
    InvalidFilename { filename: String, reason: String },

    #[error("Failed to write checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Filesystem-backed checkpoint writer scoped to one directory
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Store rooted at `dir`; the directory is expected to exist
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create `dir` (and parents) if needed, then return a store for it
    ///
    /// An existing directory is not an error.
    pub fn create(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a checkpoint with this filename is written to
    pub fn path_for(&self, filename: &str) -> CheckpointResult<PathBuf> {
        validate_filename(filename)?;
        Ok(self.dir.join(filename))
    }

    /// Write `data` as the complete contents of `<dir>/<filename>`
    pub fn checkpoint(&self, filename: &str, data: impl AsRef<[u8]>) -> CheckpointResult<()> {
        let path = self.path_for(filename)?;
        std::fs::write(&path, data.as_ref()).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("saving checkpoint to {}", path.display());
        Ok(())
    }
}

fn validate_filename(filename: &str) -> CheckpointResult<()> {
    let reason = if filename.is_empty() {
        Some("filename is empty")
    } else if filename == "." || filename == ".." {
        Some("filename refers to a directory")
    } else if filename.contains('/') || filename.contains('\\') || filename.contains('\0') {
        Some("checkpoints live in one flat directory")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CheckpointError::InvalidFilename {
            filename: filename.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
