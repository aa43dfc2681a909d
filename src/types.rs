//! Core types shared by the batch lifecycle and the HTTP surface

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tempfile::TempPath;
use utoipa::ToSchema;
use uuid::Uuid;

/// Suffix appended to a batch token to name its output directory
pub const OUTPUT_DIR_SUFFIX: &str = "_out";

/// Unique identifier for a conversion batch
///
/// A random (v4) UUID. Its hyphenated form names the batch input directory,
/// and with [`OUTPUT_DIR_SUFFIX`] appended, the batch output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Generate a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Name of this batch's input directory under the uploads root
    pub fn input_dir_name(&self) -> String {
        self.0.hyphenated().to_string()
    }

    /// Name of this batch's output directory under the converted-outputs root
    pub fn output_dir_name(&self) -> String {
        format!("{}{}", self.0.hyphenated(), OUTPUT_DIR_SUFFIX)
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Output format passed through to the converter's `-f` flag
///
/// The codes are opaque to rawconv except for [`OutputFormat::None`], which
/// tells the converter to emit metadata only, so no output files are expected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Metadata and scan headers only (code 0)
    None,
    /// mzML (code 1)
    #[default]
    Mzml,
    /// Indexed mzML (code 2)
    IndexedMzml,
    /// Parquet (code 3)
    Parquet,
    /// MGF peak list (code 4)
    Mgf,
}

impl OutputFormat {
    /// Every format, in selector order
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Mzml,
        OutputFormat::IndexedMzml,
        OutputFormat::None,
        OutputFormat::Parquet,
        OutputFormat::Mgf,
    ];

    /// Numeric code understood by the converter
    pub fn code(&self) -> u8 {
        match self {
            OutputFormat::None => 0,
            OutputFormat::Mzml => 1,
            OutputFormat::IndexedMzml => 2,
            OutputFormat::Parquet => 3,
            OutputFormat::Mgf => 4,
        }
    }

    /// Human-readable label for the upload form
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::None => "None (metadata and scan headers)",
            OutputFormat::Mzml => "mzML (default)",
            OutputFormat::IndexedMzml => "indexed mzML",
            OutputFormat::Parquet => "Parquet",
            OutputFormat::Mgf => "MGF",
        }
    }

    /// Whether a successful run is expected to leave files in the output directory
    pub fn expects_output(&self) -> bool {
        !matches!(self, OutputFormat::None)
    }

    /// Parse the form value of the output-format selector
    ///
    /// An empty value selects the default format.
    pub fn from_code(value: &str) -> Result<Self, ValidationError> {
        match value.trim() {
            "" | "1" => Ok(OutputFormat::Mzml),
            "0" => Ok(OutputFormat::None),
            "2" => Ok(OutputFormat::IndexedMzml),
            "3" => Ok(OutputFormat::Parquet),
            "4" => Ok(OutputFormat::Mgf),
            other => Err(ValidationError::InvalidOutputFormat {
                value: other.to_string(),
            }),
        }
    }
}

/// Output format entry returned by `GET /api/v1/formats`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormatInfo {
    /// Code to submit in the `output_format` field
    pub code: u8,
    /// Format identifier
    pub format: OutputFormat,
    /// Display label
    pub label: String,
    /// Whether output files are expected for this format
    pub produces_files: bool,
}

impl From<OutputFormat> for FormatInfo {
    fn from(format: OutputFormat) -> Self {
        Self {
            code: format.code(),
            format,
            label: format.label().to_string(),
            produces_files: format.expects_output(),
        }
    }
}

/// Where the contents of an upload are held until the batch is written
#[derive(Debug)]
pub enum UploadContent {
    /// In memory
    Bytes(Vec<u8>),
    /// Streamed to a staging file in the uploads root; removed when dropped
    Staged(TempPath),
    /// Never read because the filename was rejected as the part arrived
    Discarded,
}

/// A file as received from the client, before validation
#[derive(Debug)]
pub struct UploadedFile {
    /// Client-supplied filename (untrusted)
    pub file_name: String,
    /// File contents
    pub content: UploadContent,
}

impl UploadedFile {
    /// Upload held in memory
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: UploadContent::Bytes(data.into()),
        }
    }

    /// Upload whose body was never read
    pub fn discarded(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: UploadContent::Discarded,
        }
    }
}

/// Everything one upload request asks for
#[derive(Debug, Default)]
pub struct Submission {
    /// Uploaded files, in form order
    pub files: Vec<UploadedFile>,
    /// Requested output format
    pub format: OutputFormat,
    /// Raw extra converter arguments (untrusted, split on whitespace)
    pub extra_args: String,
}

/// How the converter is pointed at a batch's inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAddressing {
    /// Exactly one input: the converter receives the file path (`-i`)
    SingleFile(PathBuf),
    /// Several inputs: the converter receives the batch input directory (`-d`)
    Directory(PathBuf),
}

/// Parameters for one converter run
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Input file or directory
    pub addressing: InputAddressing,
    /// Requested output format
    pub format: OutputFormat,
    /// Raw extra arguments, appended after splitting on whitespace
    pub extra_args: Option<String>,
}

/// Exit status and captured output of a finished converter process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Final state of a batch after the converter invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Exit code 0 and at least one artifact was produced
    Converted,
    /// Exit code 0 with the metadata-only format; no artifacts expected
    NoOutputExpected,
    /// Exit code 0 but nothing was found in the output directory
    NoOutputFound,
    /// The converter exited with a non-zero (or missing) exit code
    ExitFailure {
        /// Exit code, `None` when terminated by a signal
        exit_code: Option<i32>,
    },
    /// The converter exceeded the configured timeout and was killed
    TimedOut {
        /// The configured limit in seconds
        timeout_secs: u64,
    },
    /// The converter could not be started
    ExecutionError {
        /// Underlying failure
        message: String,
    },
}

/// Severity of a user-visible status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    /// Step completed
    Success,
    /// Completed, but something the user should look at
    Warning,
    /// Step failed
    Error,
}

impl MessageLevel {
    /// CSS class suffix used by the HTML page
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageLevel::Success => "success",
            MessageLevel::Warning => "warning",
            MessageLevel::Error => "error",
        }
    }
}

/// Flash-style message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusMessage {
    /// Severity
    pub level: MessageLevel,
    /// Message text
    pub text: String,
}

impl StatusMessage {
    /// Success message
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            text: text.into(),
        }
    }

    /// Warning message
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            text: text.into(),
        }
    }

    /// Error message
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }
}

/// Everything the presentation layer needs after processing one batch
///
/// `output_subdir` together with `artifacts` is the "last batch" handle: it is
/// only set when there is something to download.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchReport {
    /// Batch identifier
    pub batch_id: BatchId,
    /// Number of files written into the batch
    pub uploaded_files: usize,
    /// Original names of files rejected by the validator
    pub skipped_files: Vec<String>,
    /// Converter outcome
    pub outcome: BatchOutcome,
    /// Names of downloadable files in the batch output directory
    pub artifacts: Vec<String>,
    /// Output directory name to address downloads with (`<token>_out`)
    pub output_subdir: Option<String>,
    /// Status messages in the order they were raised
    pub messages: Vec<StatusMessage>,
    /// Command line, exit code and captured output, for diagnostics
    pub diagnostics: Option<String>,
}

impl BatchReport {
    /// Whether any message has error level
    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_directories_derive_from_token() {
        let id = BatchId::new();
        assert_eq!(id.input_dir_name(), id.to_string());
        assert_eq!(id.output_dir_name(), format!("{id}_out"));
        assert_eq!(id.input_dir_name().len(), 36);
    }

    #[test]
    fn batch_ids_are_unique() {
        let a = BatchId::new();
        let b = BatchId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn output_format_codes_round_trip_through_form_values() {
        for format in OutputFormat::ALL {
            let parsed = OutputFormat::from_code(&format.code().to_string()).unwrap();
            assert_eq!(parsed, format);
        }
    }

    #[test]
    fn empty_output_format_selects_default() {
        assert_eq!(OutputFormat::from_code("").unwrap(), OutputFormat::Mzml);
        assert_eq!(OutputFormat::default().code(), 1);
    }

    #[test]
    fn unknown_output_format_is_rejected() {
        let err = OutputFormat::from_code("9").unwrap_err();
        match err {
            ValidationError::InvalidOutputFormat { value } => assert_eq!(value, "9"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(OutputFormat::from_code("1; rm -rf /").is_err());
    }

    #[test]
    fn only_none_format_expects_no_output() {
        assert!(!OutputFormat::None.expects_output());
        assert!(OutputFormat::Mzml.expects_output());
        assert!(OutputFormat::Mgf.expects_output());
    }

    #[test]
    fn process_output_success_requires_zero_exit() {
        let ok = ProcessOutput {
            exit_code: Some(0),
            ..Default::default()
        };
        let failed = ProcessOutput {
            exit_code: Some(2),
            ..Default::default()
        };
        let signalled = ProcessOutput::default();

        assert!(ok.success());
        assert!(!failed.success());
        assert!(!signalled.success());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(BatchOutcome::TimedOut { timeout_secs: 1800 }).unwrap();
        assert_eq!(json["status"], "timed_out");
        assert_eq!(json["timeout_secs"], 1800);

        let json = serde_json::to_value(BatchOutcome::NoOutputFound).unwrap();
        assert_eq!(json["status"], "no_output_found");
    }

    #[test]
    fn batch_id_serializes_as_plain_string() {
        let id = BatchId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
