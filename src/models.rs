use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::{validate_phone, validate_slug};

// --- Core Application Schemas (Mapped to Database) ---

/// AdminUser
///
/// The only account type in the system, stored in `admin_users`.
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminUser {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// UserInfo
///
/// Public projection of an `AdminUser`, returned by login and register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
    pub name: String,
}

impl From<&AdminUser> for UserInfo {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Lifecycle of a contact message. Only `Pending -> Read` is driven by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContactStatus {
    Pending,
    Read,
    Archived,
}

impl ContactStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Read => "read",
            Self::Archived => "archived",
        }
    }
}

impl TryFrom<String> for ContactStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "read" => Ok(Self::Read),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown contact status: {other}")),
        }
    }
}

/// ContactMessage
///
/// A stored contact-form submission from `contact_messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct ContactMessage {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// GalleryCategory
///
/// An album. `images` is not a column: repositories fill it after loading the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct GalleryCategory {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub cover_image: String,
    pub display_order: i32,
    #[sqlx(skip)]
    pub images: Vec<GalleryImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shape hint used by the frontend grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AspectRatio {
    #[default]
    Portrait,
    Landscape,
    Square,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
            Self::Square => "square",
        }
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            "square" => Ok(Self::Square),
            other => Err(format!("unknown aspect ratio: {other}")),
        }
    }
}

/// GalleryImage
///
/// One picture inside a category. Always references an existing category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct GalleryImage {
    pub id: i32,
    pub category_id: i32,
    pub src: String,
    pub alt: String,
    #[sqlx(try_from = "String")]
    pub aspect_ratio: AspectRatio,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

/// PortfolioSection
///
/// A named content block on the public site. The featured image is only changed
/// through the remote upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct PortfolioSection {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub display_order: i32,
    pub image_public_id: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---
//
// Every field carries `#[serde(default)]` so a missing field reaches the validator
// and is reported next to the other field errors instead of failing deserialization.

/// LoginRequest
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8))]
    pub password: String,
}

/// LoginResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

/// RegisterRequest
///
/// Input for `POST /api/auth/register`, only routed when registration is enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 255))]
    pub name: String,
}

/// ContactRequest
///
/// Public contact-form payload. An empty `phone` is treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 30), custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(min = 5, max = 200))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(min = 10, max = 1000))]
    pub message: String,
}

impl ContactRequest {
    /// Trims every field and drops a blank phone number.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

/// CreateCategoryRequest
///
/// When `slug` is omitted it is derived from the title before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub cover_image: String,
    #[serde(default)]
    pub display_order: i32,
}

/// UpdateCategoryRequest
///
/// Partial update. There is deliberately no `slug` field: slugs never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 255))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

/// CreateImageRequest
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct CreateImageRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 500))]
    pub src: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub alt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub display_order: i32,
}

// --- Response Payloads ---

/// Result of a single local upload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UploadResponse {
    pub url: String,
}

/// Result of a multi-file local upload, in request order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MultiUploadResponse {
    pub urls: Vec<String>,
}

/// Result of replacing a portfolio section's featured image.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SectionImageResponse {
    pub url: String,
    pub thumbnail: String,
}

/// The identity behind the current admin request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MeResponse {
    pub user_id: i32,
    pub email: String,
}
