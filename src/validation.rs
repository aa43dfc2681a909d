//! Upload screening and filename sanitization
//!
//! Nothing in this module touches the filesystem. Uploads are filtered by
//! extension and their names are rewritten into a single safe path segment
//! before the workspace writes them anywhere.

use crate::types::{UploadContent, UploadedFile};
use unicode_normalization::UnicodeNormalization;

/// An upload that passed screening
#[derive(Debug)]
pub struct AcceptedUpload {
    /// Name as sent by the client
    pub original_name: String,
    /// Name safe to use as a single path segment
    pub sanitized_name: String,
    /// File contents
    pub content: UploadContent,
}

/// Result of screening a set of uploads
#[derive(Debug, Default)]
pub struct Screening {
    /// Uploads to write into the batch, in form order
    pub accepted: Vec<AcceptedUpload>,
    /// Original names of rejected uploads, in form order
    pub skipped: Vec<String>,
}

/// Rewrite an untrusted filename into a single safe path segment
///
/// - Unicode is decomposed (NFKD) so accented letters keep their base letter
/// - Path separators (`/` and `\`) become word breaks
/// - Whitespace runs collapse into a single `_`
/// - Everything else outside `[A-Za-z0-9_.-]` is dropped, combining marks included
/// - Leading and trailing `.` and `_` are trimmed
///
/// The result never contains a separator and is never `.` or `..`, but it
/// may be empty.
///
/// # Examples
///
/// ```
/// use rawconv::validation::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/passwd.raw"), "etc_passwd.raw");
/// assert_eq!(sanitize_filename("My Sample 01.RAW"), "My_Sample_01.RAW");
/// assert_eq!(sanitize_filename("échantillon.raw"), "echantillon.raw");
/// assert_eq!(sanitize_filename(".."), "");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let spaced: String = name
        .nfkd()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    filtered.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Whether `name` ends in one of the `allowed` extensions
///
/// The extension is the text after the last `.`; comparison ignores case.
/// Names without a `.` never match.
#[must_use]
pub fn has_allowed_extension(name: &str, allowed: &[String]) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Split uploads into accepted and skipped sets
///
/// An upload is accepted when its original name has an allowed extension and
/// its sanitized name is not empty. Entries with an empty filename (an empty
/// file input) are ignored rather than reported.
pub fn screen_uploads(files: Vec<UploadedFile>, allowed: &[String]) -> Screening {
    let mut screening = Screening::default();

    for file in files {
        if file.file_name.is_empty() {
            continue;
        }

        let sanitized = sanitize_filename(&file.file_name);
        if has_allowed_extension(&file.file_name, allowed) && !sanitized.is_empty() {
            screening.accepted.push(AcceptedUpload {
                original_name: file.file_name,
                sanitized_name: sanitized,
                content: file.content,
            });
        } else {
            tracing::warn!(file_name = %file.file_name, "skipping upload with invalid type");
            screening.skipped.push(file.file_name);
        }
    }

    screening
}

/// User-visible warning for a skipped upload
pub fn skipped_message(original_name: &str) -> String {
    format!("File '{original_name}' has an invalid type and was skipped.")
}
