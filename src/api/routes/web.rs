//! Browser surface: upload page, form submission, downloads

use super::{attachment_response, read_submission};
use crate::api::AppState;
use crate::api::page::{Notice, render_page};
use crate::error::{Error, ToHttpStatus, ValidationError};
use crate::types::StatusMessage;
use crate::validation::skipped_message;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

/// Query parameters of `GET /`
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// Message code set by a failed download redirect
    pub notice: Option<String>,
}

/// GET / - Upload form
pub async fn index(Query(query): Query<IndexQuery>) -> Html<String> {
    let messages: Vec<StatusMessage> = query
        .notice
        .as_deref()
        .and_then(Notice::from_code)
        .map(|notice| notice.message())
        .into_iter()
        .collect();

    Html(render_page(&messages, None))
}

/// POST /upload-parse - Convert a batch and render the results
///
/// Renders the page in every case. Requests rejected before a batch was
/// created get the error's status code; converter failures are reported on a
/// 200 page because the batch itself was processed.
pub async fn upload_parse(State(state): State<AppState>, multipart: Multipart) -> Response {
    let submission = match read_submission(multipart, &state.processor).await {
        Ok(submission) => submission,
        Err(e) => return error_page(e),
    };

    match state.processor.process(submission).await {
        Ok(report) => Html(render_page(&report.messages, Some(&report))).into_response(),
        Err(e) => error_page(e),
    }
}

/// GET /download-parsed/:batch_subdir/*filename - Download an artifact
///
/// Failures redirect back to the form with a notice code.
pub async fn download_parsed(
    State(state): State<AppState>,
    Path((batch_subdir, filename)): Path<(String, String)>,
) -> Response {
    let served = state
        .gate
        .open(&batch_subdir, &filename)
        .await
        .and_then(attachment_response);

    match served {
        Ok(response) => response,
        Err(e) => {
            let notice = Notice::for_error(&e);
            tracing::warn!(error = %e, notice = notice.code(), "download failed");
            Redirect::to(&format!("/?notice={}", notice.code())).into_response()
        }
    }
}

fn error_page(error: Error) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut messages = Vec::new();
    let text = match &error {
        Error::Validation(inner) => {
            if let ValidationError::NoValidFiles { skipped } = inner {
                messages.extend(
                    skipped
                        .iter()
                        .map(|name| StatusMessage::warning(skipped_message(name))),
                );
            }
            inner.to_string()
        }
        other => {
            tracing::error!(error = %other, "upload failed");
            "An error occurred while preparing the batch.".to_string()
        }
    };
    messages.push(StatusMessage::error(text));

    (status, Html(render_page(&messages, None))).into_response()
}
