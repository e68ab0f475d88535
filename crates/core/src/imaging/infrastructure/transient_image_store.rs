use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write transient image in {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persists request images to uniquely named files for the lifetime of one
/// request.
pub struct TransientImageStore {
    dir: PathBuf,
}

/// Handle to a stored image. The file is removed when this is dropped.
pub struct TransientImage {
    file: NamedTempFile,
}

impl TransientImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl TransientImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn persist(&self, bytes: &[u8]) -> Result<TransientImage, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::CreateDir {
            path: self.dir.clone(),
            source: e,
        })?;

        let write_err = |e| StoreError::Write {
            path: self.dir.clone(),
            source: e,
        };
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".png")
            .tempfile_in(&self.dir)
            .map_err(write_err)?;
        file.write_all(bytes).map_err(write_err)?;
        file.flush().map_err(write_err)?;

        log::debug!("Stored transient image {}", file.path().display());
        Ok(TransientImage { file })
    }
}
