use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::validation::FieldError;

/// ApiResponse
///
/// The uniform envelope wrapped around every `/api` response body, success or error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Status plus envelope; what every handler returns on success.
pub type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            pagination: None,
        }
    }

    /// One page of a list, with its position in the whole collection.
    pub fn paginated(message: impl Into<String>, data: T, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::ok(message, data)
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload (`data` is omitted from the JSON).
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
            pagination: None,
        }
    }

    pub fn failure(message: impl Into<String>, errors: Option<Vec<FieldError>>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors,
            pagination: None,
        }
    }
}

pub fn reply<T>(status: StatusCode, message: impl Into<String>, data: T) -> Reply<T> {
    (status, Json(ApiResponse::ok(message, data)))
}

pub fn reply_paginated<T>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
    pagination: Pagination,
) -> Reply<T> {
    (status, Json(ApiResponse::paginated(message, data, pagination)))
}

pub fn reply_empty(status: StatusCode, message: impl Into<String>) -> Reply<()> {
    (status, Json(ApiResponse::done(message)))
}

/// Pagination
///
/// Page arithmetic for list endpoints: `pages` is the ceiling of `total / page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    /// A zero `page` or `page_size` is clamped to 1.
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        Self {
            page,
            page_size,
            total,
            pages: total.div_ceil(u64::from(page_size)),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Cuts this page out of the full, already ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(skip)
            .take(self.page_size as usize)
            .collect()
    }
}
