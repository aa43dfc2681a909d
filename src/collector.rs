//! Artifact enumeration after a successful converter run

use crate::error::Result;
use crate::types::{BatchOutcome, OutputFormat, StatusMessage};
use std::path::Path;

/// Names of the regular files directly inside `output_dir`, sorted
///
/// Symlinks are followed, so a link to a regular file is listed and a dangling
/// link is not. Subdirectories are not descended into. Names that are not valid UTF-8
/// cannot be addressed by a download link and are skipped with a warning.
pub async fn collect_artifacts(output_dir: &Path) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(output_dir).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        match tokio::fs::metadata(entry.path()).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = ?entry.path(), "skipping dangling artifact link");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => {
                tracing::warn!(file = ?raw, dir = ?output_dir, "skipping artifact with non UTF-8 name");
            }
        }
    }

    names.sort();
    Ok(names)
}

/// Outcome of a zero exit code, and the message to show for it
///
/// Returns no message for [`BatchOutcome::Converted`]: the artifact list speaks
/// for itself.
pub fn evaluate(format: OutputFormat, artifacts: &[String]) -> (BatchOutcome, Option<StatusMessage>) {
    if !artifacts.is_empty() {
        return (BatchOutcome::Converted, None);
    }

    if format.expects_output() {
        (
            BatchOutcome::NoOutputFound,
            Some(StatusMessage::warning(
                "Processing complete, but no output files found in the expected directory.",
            )),
        )
    } else {
        (
            BatchOutcome::NoOutputExpected,
            Some(StatusMessage::success(
                "Processing complete (output format was 'None'). No files to download.",
            )),
        )
    }
}
