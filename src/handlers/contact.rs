use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::{AppError, ApiResult},
    models::{ContactMessage, ContactRequest},
    response::{Pagination, Reply, reply, reply_empty, reply_paginated},
};

use super::{JsonBody, parse_id, validate_payload};

/// submit_contact
///
/// [Public Route] Stores a contact-form submission as `pending`, then hands the
/// acknowledgment and owner alert to the notifier.
///
/// The response depends only on the insert: notifications run in the background
/// and their failures are logged, never reported here.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message stored", body = ContactMessage),
        (status = 400, description = "Invalid request body or field errors"),
        (status = 500, description = "Failed to submit message")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ContactRequest>,
) -> ApiResult<Reply<ContactMessage>> {
    let req = req.normalized();
    validate_payload(&req)?;

    let saved = state
        .repo
        .create_contact(&req)
        .await
        .map_err(|e| AppError::internal("Failed to submit message", e))?;

    tracing::info!(message_id = saved.id, "contact message stored");
    state.notifier.notify_contact(&saved);

    Ok(reply(StatusCode::CREATED, "Message sent successfully", saved))
}

/// Page size used when only `page` is given.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// ContactListQuery
///
/// Optional paging for the inbox. Without either parameter the whole inbox is returned.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ContactListQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// list_contacts
///
/// [Admin Route] Stored messages, newest first. With `page` or `page_size` the
/// response carries one page plus a `pagination` block.
#[utoipa::path(
    get,
    path = "/api/admin/contacts",
    params(ContactListQuery),
    responses(
        (status = 200, description = "Messages retrieved", body = [ContactMessage]),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    query: Result<Query<ContactListQuery>, QueryRejection>,
) -> ApiResult<Reply<Vec<ContactMessage>>> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "rejected contact list query");
        AppError::BadRequest("Invalid pagination parameters".into())
    })?;

    let messages = state
        .repo
        .list_contacts()
        .await
        .map_err(|e| AppError::internal("Failed to fetch messages", e))?;

    if query.page.is_none() && query.page_size.is_none() {
        return Ok(reply(StatusCode::OK, "Messages retrieved", messages));
    }

    let pagination = Pagination::new(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        messages.len() as u64,
    );
    Ok(reply_paginated(
        StatusCode::OK,
        "Messages retrieved",
        pagination.slice(messages),
        pagination,
    ))
}

/// mark_contact_read
///
/// [Admin Route] Moves a message from `pending` to `read`.
#[utoipa::path(
    patch,
    path = "/api/admin/contacts/{id}/read",
    params(("id" = i32, Path, description = "Contact message id")),
    responses(
        (status = 200, description = "Message marked as read"),
        (status = 400, description = "Invalid contact ID"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_contact_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    let id = parse_id(&id, "Invalid contact ID")?;

    let updated = state
        .repo
        .mark_contact_read(id)
        .await
        .map_err(|e| AppError::internal("Failed to update message", e))?;
    if !updated {
        return Err(AppError::NotFound("Message not found".into()));
    }

    Ok(reply_empty(StatusCode::OK, "Message marked as read"))
}

/// delete_contact
///
/// [Admin Route] Permanently removes a message.
#[utoipa::path(
    delete,
    path = "/api/admin/contacts/{id}",
    params(("id" = i32, Path, description = "Contact message id")),
    responses(
        (status = 200, description = "Message deleted successfully"),
        (status = 400, description = "Invalid contact ID"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    let id = parse_id(&id, "Invalid contact ID")?;

    let deleted = state
        .repo
        .delete_contact(id)
        .await
        .map_err(|e| AppError::internal("Failed to delete message", e))?;
    if !deleted {
        return Err(AppError::NotFound("Message not found".into()));
    }

    tracing::info!(message_id = id, "contact message deleted");
    Ok(reply_empty(StatusCode::OK, "Message deleted successfully"))
}
