use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, ApiResult},
    models::{
        CreateCategoryRequest, CreateImageRequest, GalleryCategory, GalleryImage,
        UpdateCategoryRequest,
    },
    repository::RepositoryState,
    response::{Reply, reply, reply_empty},
    validation::generate_slug,
};

use super::{JsonBody, ValidatedJson, parse_id, repo_failure, validate_payload};

/// list_galleries
///
/// [Public Route] All categories with their images, ordered for display.
#[utoipa::path(
    get,
    path = "/api/galleries",
    responses((status = 200, description = "Galleries retrieved", body = [GalleryCategory]))
)]
pub async fn list_galleries(
    State(repo): State<RepositoryState>,
) -> ApiResult<Reply<Vec<GalleryCategory>>> {
    let categories = repo
        .list_categories()
        .await
        .map_err(repo_failure("Failed to fetch galleries"))?;

    Ok(reply(StatusCode::OK, "Galleries retrieved", categories))
}

/// get_gallery
///
/// [Public Route] One category by slug.
#[utoipa::path(
    get,
    path = "/api/galleries/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Gallery retrieved", body = GalleryCategory),
        (status = 404, description = "Gallery not found")
    )
)]
pub async fn get_gallery(
    State(repo): State<RepositoryState>,
    Path(slug): Path<String>,
) -> ApiResult<Reply<GalleryCategory>> {
    let category = repo
        .find_category_by_slug(&slug)
        .await
        .map_err(repo_failure("Failed to fetch gallery"))?
        .ok_or_else(|| AppError::NotFound("Gallery not found".into()))?;

    Ok(reply(StatusCode::OK, "Gallery retrieved", category))
}

/// create_gallery
///
/// [Admin Route] Creates a category. A missing slug is derived from the title; an
/// explicit one must already be URL-safe. Slugs are unique and never change afterwards.
#[utoipa::path(
    post,
    path = "/api/admin/galleries",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Gallery created successfully", body = GalleryCategory),
        (status = 400, description = "Field errors or slug already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_gallery(
    State(state): State<AppState>,
    JsonBody(mut req): JsonBody<CreateCategoryRequest>,
) -> ApiResult<Reply<GalleryCategory>> {
    req.title = req.title.trim().to_string();
    req.slug = req.slug.trim().to_string();
    if req.slug.is_empty() {
        req.slug = generate_slug(&req.title);
    }
    validate_payload(&req)?;

    let category = state
        .repo
        .create_category(&req)
        .await
        .map_err(repo_failure("Failed to create gallery"))?;

    tracing::info!(category_id = category.id, slug = %category.slug, "gallery created");
    Ok(reply(StatusCode::CREATED, "Gallery created successfully", category))
}

/// update_gallery
///
/// [Admin Route] Partial update; fields absent from the body keep their value.
#[utoipa::path(
    put,
    path = "/api/admin/galleries/{id}",
    params(("id" = i32, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Gallery updated successfully", body = GalleryCategory),
        (status = 400, description = "Invalid gallery ID or field errors"),
        (status = 404, description = "Gallery not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_gallery(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateCategoryRequest>,
) -> ApiResult<Reply<GalleryCategory>> {
    let id = parse_id(&id, "Invalid gallery ID")?;

    let category = state
        .repo
        .update_category(id, &req)
        .await
        .map_err(repo_failure("Failed to update gallery"))?
        .ok_or_else(|| AppError::NotFound("Gallery not found".into()))?;

    Ok(reply(StatusCode::OK, "Gallery updated successfully", category))
}

/// delete_gallery
///
/// [Admin Route] Removes a category together with all of its images.
#[utoipa::path(
    delete,
    path = "/api/admin/galleries/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Gallery deleted successfully"),
        (status = 400, description = "Invalid gallery ID"),
        (status = 404, description = "Gallery not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_gallery(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    let id = parse_id(&id, "Invalid gallery ID")?;

    let deleted = state
        .repo
        .delete_category(id)
        .await
        .map_err(repo_failure("Failed to delete gallery"))?;
    if !deleted {
        return Err(AppError::NotFound("Gallery not found".into()));
    }

    tracing::info!(category_id = id, "gallery deleted");
    Ok(reply_empty(StatusCode::OK, "Gallery deleted successfully"))
}

/// create_image
///
/// [Admin Route] Adds an image to an existing category.
#[utoipa::path(
    post,
    path = "/api/admin/galleries/{id}/images",
    params(("id" = i32, Path, description = "Category id")),
    request_body = CreateImageRequest,
    responses(
        (status = 201, description = "Image created successfully", body = GalleryImage),
        (status = 400, description = "Invalid gallery ID or field errors"),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateImageRequest>,
) -> ApiResult<Reply<GalleryImage>> {
    let category_id = parse_id(&id, "Invalid gallery ID")?;

    let image = state
        .repo
        .create_image(category_id, &req)
        .await
        .map_err(repo_failure("Failed to create image"))?;

    Ok(reply(StatusCode::CREATED, "Image created successfully", image))
}

/// delete_image
///
/// [Admin Route] Removes a single gallery image.
#[utoipa::path(
    delete,
    path = "/api/admin/images/{id}",
    params(("id" = i32, Path, description = "Image id")),
    responses(
        (status = 200, description = "Image deleted successfully"),
        (status = 400, description = "Invalid image ID"),
        (status = 404, description = "Image not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    let id = parse_id(&id, "Invalid image ID")?;

    let deleted = state
        .repo
        .delete_image(id)
        .await
        .map_err(repo_failure("Failed to delete image"))?;
    if !deleted {
        return Err(AppError::NotFound("Image not found".into()));
    }

    Ok(reply_empty(StatusCode::OK, "Image deleted successfully"))
}
