//! Route handlers
//!
//! - [`web`]: the HTML upload page and browser downloads
//! - [`batches`]: JSON batch submission, artifact downloads, format list
//! - [`system`]: health and OpenAPI
//!
//! Both surfaces accept the same multipart contract, parsed by
//! [`read_submission`].

use crate::batch::BatchProcessor;
use crate::download::ArtifactFile;
use crate::error::{Error, Result, ValidationError, WorkspaceError};
use crate::types::{OutputFormat, Submission, UploadContent, UploadedFile};
use crate::validation::has_allowed_extension;
use crate::workspace::WorkspaceManager;
use axum::{
    body::Body,
    extract::{
        Multipart,
        multipart::{Field, MultipartError},
    },
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

mod batches;
mod system;
mod web;

pub use batches::*;
pub use system::*;
pub use web::*;

/// Multipart field holding the uploaded files (repeated)
pub const FILES_FIELD: &str = "files";
/// Multipart field holding the output format code
pub const FORMAT_FIELD: &str = "output_format";
/// Multipart field holding extra converter arguments
pub const EXTRA_ARGS_FIELD: &str = "additional_args";

/// Multipart form accepted by `POST /upload-parse` and `POST /api/v1/batches`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UploadForm {
    /// One or more RAW files (binary parts, repeated field)
    pub files: Vec<String>,
    /// Output format code `0`-`4` (default `1`, mzML)
    pub output_format: Option<String>,
    /// Extra converter arguments, split on whitespace
    pub additional_args: Option<String>,
}

/// Read the upload form into a [`Submission`]
///
/// Unknown fields are ignored. File parts keep their client-supplied name.
/// A part whose name has no allowed extension is recorded without reading its
/// body; every other part is streamed chunk by chunk into a staging file in the
/// uploads root, so no upload is held in memory.
pub async fn read_submission(
    mut multipart: Multipart,
    processor: &BatchProcessor,
) -> Result<Submission> {
    let allowed = &processor.config().converter.allowed_extensions;
    let mut files = Vec::new();
    let mut format_code = String::new();
    let mut extra_args = String::new();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            FILES_FIELD => {
                let file_name = field.file_name().unwrap_or("").to_string();
                if file_name.is_empty() || !has_allowed_extension(&file_name, allowed) {
                    files.push(UploadedFile::discarded(file_name));
                    continue;
                }
                let staged = stage_field(field, processor.workspace()).await?;
                files.push(UploadedFile {
                    file_name,
                    content: UploadContent::Staged(staged),
                });
            }
            FORMAT_FIELD => format_code = field.text().await.map_err(malformed)?,
            EXTRA_ARGS_FIELD => extra_args = field.text().await.map_err(malformed)?,
            _ => {}
        }
    }

    Ok(Submission {
        files,
        format: OutputFormat::from_code(&format_code)?,
        extra_args,
    })
}

async fn stage_field(mut field: Field<'_>, workspace: &WorkspaceManager) -> Result<TempPath> {
    let (mut file, staged) = workspace.create_staging_file()?;
    let write_failed = |e: std::io::Error| WorkspaceError::WriteFailed {
        path: staged.to_path_buf(),
        reason: e.to_string(),
    };

    let mut bytes: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        bytes += chunk.len() as u64;
        file.write_all(&chunk).await.map_err(write_failed)?;
    }
    file.flush().await.map_err(write_failed)?;

    tracing::debug!(path = ?staged, bytes, "staged upload");
    Ok(staged)
}

fn malformed(e: MultipartError) -> Error {
    ValidationError::MalformedUpload {
        reason: e.body_text(),
    }
    .into()
}

/// Stream an artifact as an attachment
pub fn attachment_response(artifact: ArtifactFile) -> Result<Response> {
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        artifact.file_name
    ))
    .map_err(|e| Error::Other(format!("invalid attachment name: {e}")))?;

    tracing::info!(path = ?artifact.path, bytes = artifact.len, "serving artifact");

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(artifact.len)),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    let body = Body::from_stream(ReaderStream::new(artifact.file));

    Ok((headers, body).into_response())
}
