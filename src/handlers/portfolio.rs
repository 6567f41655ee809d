use axum::{
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
};

use crate::{
    AppState,
    compensation::perform_with_compensation,
    error::{AppError, ApiResult},
    models::{PortfolioSection, SectionImageResponse},
    response::{Reply, reply},
};

use super::{
    parse_id,
    upload::{multipart_body, multipart_error, read_file_field},
};

/// list_sections
///
/// [Admin Route] Portfolio sections in display order.
#[utoipa::path(
    get,
    path = "/api/admin/portfolio/sections",
    responses(
        (status = 200, description = "Sections retrieved", body = [PortfolioSection]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_sections(
    State(state): State<AppState>,
) -> ApiResult<Reply<Vec<PortfolioSection>>> {
    let sections = state
        .repo
        .list_sections()
        .await
        .map_err(|e| AppError::internal("Failed to fetch sections", e))?;

    Ok(reply(StatusCode::OK, "Sections retrieved", sections))
}

/// update_section_image
///
/// [Admin Route] Replaces a section's featured image with the multipart field `image`.
///
/// 1. Upload to the remote image host.
/// 2. Store the new reference on the section.
/// 3. If step 2 fails (database error or unknown section) the asset from step 1 is
///    deleted again. A failed cleanup is only logged; the caller sees the step 2 error.
#[utoipa::path(
    put,
    path = "/api/admin/portfolio/sections/{id}/image",
    params(("id" = i32, Path, description = "Portfolio section id")),
    request_body(content_type = "multipart/form-data", description = "Field `image`: the new image"),
    responses(
        (status = 200, description = "Image updated successfully", body = SectionImageResponse),
        (status = 400, description = "Invalid section ID or missing image"),
        (status = 404, description = "Section not found"),
        (status = 500, description = "Upload or update failed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_section_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Reply<SectionImageResponse>> {
    let section_id = parse_id(&id, "Invalid section ID")?;
    let mut multipart = multipart_body(multipart)?;

    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("image") {
            file = Some(read_file_field(field, state.config.max_file_size).await?);
            break;
        }
    }
    let file = file.ok_or_else(|| AppError::BadRequest("No image provided".into()))?;

    let uploaded = state.images.upload(file).await?;

    let persist = async {
        match state
            .repo
            .set_section_image(section_id, &uploaded.public_id, &uploaded.secure_url)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::NotFound("Section not found".into())),
            Err(e) => Err(AppError::internal("Failed to update section", e)),
        }
    };
    let cleanup = state.images.delete(&uploaded.public_id);
    perform_with_compensation(persist, cleanup).await?;

    tracing::info!(section_id, public_id = %uploaded.public_id, "section image updated");
    Ok(reply(
        StatusCode::OK,
        "Image updated successfully",
        SectionImageResponse {
            url: uploaded.secure_url,
            thumbnail: uploaded.thumbnail_url,
        },
    ))
}
