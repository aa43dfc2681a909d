//! JSON batch handlers

use super::{attachment_response, read_submission};
use crate::api::AppState;
use crate::error::Result;
use crate::types::{BatchReport, FormatInfo, OutputFormat};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
};

/// POST /batches - Upload files and convert them as one batch
#[utoipa::path(
    post,
    path = "/api/v1/batches",
    tag = "batches",
    request_body(content = super::UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Batch processed; inspect `outcome` for the converter result", body = BatchReport),
        (status = 400, description = "No files selected, unknown output format, or malformed form", body = crate::error::ApiError),
        (status = 422, description = "No uploaded file had an allowed extension", body = crate::error::ApiError),
        (status = 500, description = "Batch directories could not be prepared", body = crate::error::ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn create_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchReport>)> {
    let submission = read_submission(multipart, &state.processor).await?;
    let report = state.processor.process(submission).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /batches/:batch_subdir/files/*filename - Download one artifact
#[utoipa::path(
    get,
    path = "/api/v1/batches/{batch_subdir}/files/{filename}",
    tag = "batches",
    params(
        ("batch_subdir" = String, Path, description = "Batch output directory (`<batch_id>_out`)"),
        ("filename" = String, Path, description = "Artifact name")
    ),
    responses(
        (status = 200, description = "Artifact contents", content_type = "application/octet-stream"),
        (status = 400, description = "Address sanitized to nothing", body = crate::error::ApiError),
        (status = 404, description = "No such artifact", body = crate::error::ApiError),
        (status = 500, description = "Artifact could not be read", body = crate::error::ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((batch_subdir, filename)): Path<(String, String)>,
) -> Result<Response> {
    let artifact = state.gate.open(&batch_subdir, &filename).await?;
    attachment_response(artifact)
}

/// GET /formats - Supported output formats
#[utoipa::path(
    get,
    path = "/api/v1/formats",
    tag = "batches",
    responses(
        (status = 200, description = "Output formats in selector order", body = Vec<FormatInfo>)
    ),
    security(("api_key" = []))
)]
pub async fn list_formats() -> Json<Vec<FormatInfo>> {
    Json(OutputFormat::ALL.into_iter().map(FormatInfo::from).collect())
}
