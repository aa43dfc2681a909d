//! Error types for rawconv
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (validation, workspace, converter, download)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for rawconv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rawconv
///
/// Each variant includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "upload_dir")
        key: Option<String>,
    },

    /// Upload rejected before any batch was created
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Batch directory allocation or population failed
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// The external converter could not be run to completion
    #[error("converter error: {0}")]
    Converter(#[from] ConverterError),

    /// Artifact download failed
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Upload validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The request carried no file, or only entries without a filename
    #[error("No files selected.")]
    NoFilesSelected,

    /// Every uploaded file was rejected by the extension allow-list
    #[error("No valid files were uploaded.")]
    NoValidFiles {
        /// Original (client-supplied) names of the rejected files
        skipped: Vec<String>,
    },

    /// The output format selector is not one of the known codes
    #[error("unknown output format '{value}'")]
    InvalidOutputFormat {
        /// The value that was submitted
        value: String,
    },

    /// The multipart body could not be read
    #[error("malformed upload: {reason}")]
    MalformedUpload {
        /// Why the body was rejected
        reason: String,
    },
}

/// Batch workspace errors
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// A batch directory could not be created
    #[error("failed to create directory {}: {reason}", path.display())]
    CreateFailed {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },

    /// An uploaded file could not be written into the batch
    #[error("failed to write {}: {reason}", path.display())]
    WriteFailed {
        /// Destination path of the upload
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },
}

/// External converter failures that prevent an exit status from being observed
///
/// A non-zero exit code is not an error: it is reported through
/// [`crate::types::ProcessOutput`].
#[derive(Debug, Error)]
pub enum ConverterError {
    /// The converter ran longer than the configured limit and was killed
    #[error("converter timed out after {}s", timeout.as_secs())]
    TimedOut {
        /// The limit that was exceeded
        timeout: Duration,
    },

    /// The converter process could not be spawned
    #[error("failed to execute {}: {reason}", program.display())]
    FailedToStart {
        /// Program that was launched
        program: PathBuf,
        /// Underlying spawn failure (missing binary, permission denied, ...)
        reason: String,
    },
}

/// Artifact download errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The batch directory or filename sanitized to nothing
    #[error("Invalid filename or batch directory for download.")]
    InvalidTarget,

    /// No regular file exists at the resolved path
    #[error("File not found for download.")]
    NotFound {
        /// The resolved path
        path: PathBuf,
    },

    /// The file exists but could not be opened
    #[error("Error during download: {reason}")]
    Io {
        /// The resolved path
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "no_valid_files",
///     "message": "validation error: No valid files were uploaded.",
///     "details": {
///       "skipped": ["notes.txt"]
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "no_valid_files")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Validation(ValidationError::NoFilesSelected) => 400,
            Error::Validation(ValidationError::InvalidOutputFormat { .. }) => 400,
            Error::Validation(ValidationError::MalformedUpload { .. }) => 400,
            Error::Download(DownloadError::InvalidTarget) => 400,

            // 422 Unprocessable Entity - Nothing usable in the upload
            Error::Validation(ValidationError::NoValidFiles { .. }) => 422,

            // 404 Not Found
            Error::Download(DownloadError::NotFound { .. }) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Config { .. } => 500,
            Error::Workspace(_) => 500,
            Error::Download(DownloadError::Io { .. }) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 503 Service Unavailable - External tool could not be started
            Error::Converter(ConverterError::FailedToStart { .. }) => 503,

            // 504 Gateway Timeout - External tool exceeded its limit
            Error::Converter(ConverterError::TimedOut { .. }) => 504,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(e) => match e {
                ValidationError::NoFilesSelected => "no_files_selected",
                ValidationError::NoValidFiles { .. } => "no_valid_files",
                ValidationError::InvalidOutputFormat { .. } => "invalid_output_format",
                ValidationError::MalformedUpload { .. } => "malformed_upload",
            },
            Error::Workspace(e) => match e {
                WorkspaceError::CreateFailed { .. } => "workspace_create_failed",
                WorkspaceError::WriteFailed { .. } => "workspace_write_failed",
            },
            Error::Converter(e) => match e {
                ConverterError::TimedOut { .. } => "converter_timed_out",
                ConverterError::FailedToStart { .. } => "converter_failed_to_start",
            },
            Error::Download(e) => match e {
                DownloadError::InvalidTarget => "invalid_download_target",
                DownloadError::NotFound { .. } => "file_not_found",
                DownloadError::Io { .. } => "download_failed",
            },
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Details only for variants that carry something a client can act on
        let details = match &error {
            Error::Validation(ValidationError::NoValidFiles { skipped }) => {
                Some(serde_json::json!({
                    "skipped": skipped,
                }))
            }
            Error::Validation(ValidationError::InvalidOutputFormat { value }) => {
                Some(serde_json::json!({
                    "value": value,
                    "allowed": ["0", "1", "2", "3", "4"],
                }))
            }
            Error::Converter(ConverterError::TimedOut { timeout }) => Some(serde_json::json!({
                "timeout_secs": timeout.as_secs(),
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
