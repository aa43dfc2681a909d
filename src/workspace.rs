//! Per-batch input/output directory management
//!
//! Batches are isolated purely by their unique token: nothing here locks, and
//! no batch ever reads another batch's directories.

use crate::config::StorageConfig;
use crate::error::{Result, WorkspaceError};
use crate::types::{BatchId, UploadContent};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, info};

/// Name prefix of upload staging files in the uploads root
pub const STAGING_PREFIX: &str = ".upload-";

/// Directory pair allocated for one batch
#[derive(Debug, Clone)]
pub struct BatchWorkspace {
    /// Batch identifier
    pub id: BatchId,
    /// `<upload_dir>/<token>`
    pub input_dir: PathBuf,
    /// `<converted_dir>/<token>_out`
    pub output_dir: PathBuf,
}

impl BatchWorkspace {
    /// Name of the output directory, as used in download links
    pub fn output_subdir(&self) -> String {
        self.id.output_dir_name()
    }
}

/// Allocates and cleans up batch directories under the two storage roots
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    upload_root: PathBuf,
    converted_root: PathBuf,
}

impl WorkspaceManager {
    /// Create a manager for the configured roots
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            upload_root: storage.upload_dir.clone(),
            converted_root: storage.converted_dir.clone(),
        }
    }

    /// Uploads root
    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    /// Converted-outputs root
    pub fn converted_root(&self) -> &Path {
        &self.converted_root
    }

    /// Create both roots (and their parents) if missing
    pub async fn ensure_roots(&self) -> Result<()> {
        create_dir(&self.upload_root).await?;
        create_dir(&self.converted_root).await?;
        info!(upload_root = ?self.upload_root, converted_root = ?self.converted_root, "storage roots ready");
        Ok(())
    }

    /// Allocate a fresh batch and create its input and output directories
    ///
    /// If the output directory cannot be created the input directory is
    /// removed again before the error is returned.
    pub async fn allocate(&self) -> Result<BatchWorkspace> {
        let id = BatchId::new();
        let workspace = BatchWorkspace {
            id,
            input_dir: self.upload_root.join(id.input_dir_name()),
            output_dir: self.output_dir_for(&id),
        };

        create_dir(&workspace.input_dir).await?;
        info!(batch_id = %id, path = ?workspace.input_dir, "created batch upload directory");

        if let Err(e) = create_dir(&workspace.output_dir).await {
            self.discard(&workspace).await;
            return Err(e);
        }
        info!(batch_id = %id, path = ?workspace.output_dir, "created batch converted directory");

        Ok(workspace)
    }

    /// Create an empty staging file for an upload that is still arriving
    ///
    /// The file lives directly in the uploads root, so moving it into a batch
    /// directory is a rename on the same filesystem. It is deleted when the
    /// returned [`TempPath`] is dropped without being written into a batch.
    pub fn create_staging_file(&self) -> Result<(tokio::fs::File, TempPath)> {
        let (file, path) = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.upload_root)
            .map_err(|e| WorkspaceError::WriteFailed {
                path: self.upload_root.clone(),
                reason: e.to_string(),
            })?
            .into_parts();
        debug!(path = ?path, "created upload staging file");
        Ok((tokio::fs::File::from_std(file), path))
    }

    /// Write one accepted upload into the batch input directory
    ///
    /// `sanitized_name` must already be a single safe path segment. An existing
    /// file with the same name is overwritten. Staged uploads are moved, not
    /// copied.
    pub async fn write_input(
        &self,
        workspace: &BatchWorkspace,
        sanitized_name: &str,
        content: UploadContent,
    ) -> Result<PathBuf> {
        let path = workspace.input_dir.join(sanitized_name);
        let written = match content {
            UploadContent::Bytes(data) => tokio::fs::write(&path, data).await,
            UploadContent::Staged(staged) => staged.persist(&path).map_err(|e| e.error),
            UploadContent::Discarded => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "upload body was not kept",
            )),
        };
        written.map_err(|e| WorkspaceError::WriteFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        info!(batch_id = %workspace.id, file = %sanitized_name, path = ?path, "saved uploaded file");
        Ok(path)
    }

    /// Remove both batch directories, ignoring errors
    pub async fn discard(&self, workspace: &BatchWorkspace) {
        for dir in [&workspace.input_dir, &workspace.output_dir] {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => debug!(batch_id = %workspace.id, path = ?dir, "removed batch directory"),
                Err(e) => {
                    debug!(batch_id = %workspace.id, path = ?dir, error = %e, "batch directory cleanup failed")
                }
            }
        }
    }

    /// Output directory of a batch, rebuilt from its token
    pub fn output_dir_for(&self, id: &BatchId) -> PathBuf {
        self.converted_root.join(id.output_dir_name())
    }
}

async fn create_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await.map_err(|e| {
        WorkspaceError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}
