use axum::{
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, ApiResult},
    models::{MultiUploadResponse, UploadResponse},
    response::{Reply, reply},
    storage::{StorageError, UploadedFile, check_content_type},
};

/// Turns a missing or unreadable multipart body into the envelope's 400.
pub(super) fn multipart_body(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Multipart, AppError> {
    multipart.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "rejected multipart body");
        AppError::BadRequest("Invalid form data".into())
    })
}

pub(super) fn multipart_error(err: MultipartError) -> AppError {
    tracing::debug!(reason = %err.body_text(), status = %err.status(), "multipart read failed");
    AppError::BadRequest("Invalid form data".into())
}

/// read_file_field
///
/// Buffers one multipart file. The content type is checked before any byte is read
/// and the size ceiling is checked on every chunk, so an oversized file is abandoned
/// mid-stream and nothing reaches the disk.
pub(super) async fn read_file_field(
    mut field: Field<'_>,
    max_bytes: usize,
) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();
    check_content_type(&content_type)?;

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(StorageError::TooLarge { max_bytes }.into());
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
    })
}

/// upload_file
///
/// [Admin Route] Stores one image from the multipart field `file` on local disk and
/// returns its public URL.
#[utoipa::path(
    post,
    path = "/api/admin/upload",
    request_body(content_type = "multipart/form-data", description = "Field `file`: the image"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "No file, unsupported type or too large")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Reply<UploadResponse>> {
    let mut multipart = multipart_body(multipart)?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file = read_file_field(field, state.storage.max_file_size()).await?;
        let url = state.storage.save(file).await?;

        tracing::info!(url = %url, "file uploaded");
        return Ok(reply(
            StatusCode::OK,
            "File uploaded successfully",
            UploadResponse { url },
        ));
    }

    Err(AppError::BadRequest("No file uploaded".into()))
}

/// upload_files
///
/// [Admin Route] Stores every image sent in the multipart field `files`.
///
/// All or nothing: when one file is rejected, the files already written by this
/// request are deleted before the error is returned.
#[utoipa::path(
    post,
    path = "/api/admin/upload/multiple",
    request_body(content_type = "multipart/form-data", description = "Field `files`: one or more images"),
    responses(
        (status = 200, description = "Files uploaded successfully", body = MultiUploadResponse),
        (status = 400, description = "No files, too many files, unsupported type or too large")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Reply<MultiUploadResponse>> {
    let mut multipart = multipart_body(multipart)?;
    let max_files = state.config.max_upload_files;
    let mut urls: Vec<String> = Vec::new();

    let outcome = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some("files") {
                continue;
            }
            if urls.len() >= max_files {
                return Err(AppError::BadRequest(format!(
                    "Too many files (max {max_files})"
                )));
            }

            let file = read_file_field(field, state.storage.max_file_size()).await?;
            urls.push(state.storage.save(file).await?);
        }
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(err) = outcome {
        for url in &urls {
            if let Err(e) = state.storage.delete(url).await {
                tracing::warn!(url = %url, error = %e, "failed to remove partial upload");
            }
        }
        return Err(err);
    }

    if urls.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".into()));
    }

    tracing::info!(count = urls.len(), "files uploaded");
    Ok(reply(
        StatusCode::OK,
        "Files uploaded successfully",
        MultiUploadResponse { urls },
    ))
}
