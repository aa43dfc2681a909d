//! Artifact download resolution
//!
//! A download is addressed by two client-supplied strings: the batch output
//! directory name and the file name. Both are sanitized independently into a
//! single path segment, so the resolved path is always exactly two levels
//! below the converted-outputs root.

use crate::error::{DownloadError, Result};
use crate::validation::sanitize_filename;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// An artifact opened for streaming
#[derive(Debug)]
pub struct ArtifactFile {
    /// Sanitized file name, for the attachment header
    pub file_name: String,
    /// Resolved location
    pub path: PathBuf,
    /// Open handle
    pub file: tokio::fs::File,
    /// Size in bytes
    pub len: u64,
}

/// Maps download addresses to files under the converted-outputs root
#[derive(Debug, Clone)]
pub struct DownloadGate {
    converted_root: PathBuf,
}

impl DownloadGate {
    /// Create a gate serving from `converted_root`
    pub fn new(converted_root: impl Into<PathBuf>) -> Self {
        Self {
            converted_root: converted_root.into(),
        }
    }

    /// Root all downloads are served from
    pub fn converted_root(&self) -> &Path {
        &self.converted_root
    }

    /// Resolve a download address without touching the filesystem
    pub fn resolve(&self, batch_subdir: &str, filename: &str) -> Result<PathBuf> {
        let subdir = sanitize_filename(batch_subdir);
        let file = sanitize_filename(filename);

        if subdir.is_empty() || file.is_empty() {
            tracing::warn!(batch_subdir = %batch_subdir, filename = %filename, "rejected download address");
            return Err(DownloadError::InvalidTarget.into());
        }

        Ok(self.converted_root.join(subdir).join(file))
    }

    /// Resolve and open a download address
    pub async fn open(&self, batch_subdir: &str, filename: &str) -> Result<ArtifactFile> {
        let path = self.resolve(batch_subdir, filename)?;
        tracing::info!(path = ?path, "download requested");

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(DownloadError::NotFound { path }.into()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DownloadError::NotFound { path }.into());
            }
            Err(e) => {
                return Err(DownloadError::Io {
                    reason: e.to_string(),
                    path,
                }
                .into());
            }
        };

        let file = tokio::fs::File::open(&path).await.map_err(|e| DownloadError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ArtifactFile {
            file_name,
            path,
            file,
            len: metadata.len(),
        })
    }
}
