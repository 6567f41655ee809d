use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    AdminUser, ContactMessage, ContactRequest, CreateCategoryRequest, CreateImageRequest,
    GalleryCategory, GalleryImage, PortfolioSection, UpdateCategoryRequest,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// RepoError
///
/// Persistence failures, before they are mapped to HTTP by `AppError`.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A uniqueness constraint (category slug, admin email) was hit.
    #[error("{0}")]
    Conflict(String),

    /// A row referenced a parent that does not exist (image without category).
    #[error("{0}")]
    MissingParent(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => Self::Conflict("Resource already exists".into()),
            Some(FOREIGN_KEY_VIOLATION) => Self::MissingParent("Parent resource not found".into()),
            _ => Self::Database(err),
        }
    }
}

impl RepoError {
    /// Replaces the generic conflict text with a resource-specific one.
    pub fn on_conflict(self, message: &str) -> Self {
        match self {
            Self::Conflict(_) => Self::Conflict(message.to_string()),
            other => other,
        }
    }

    /// Replaces the generic missing-parent text with a resource-specific one.
    pub fn on_missing_parent(self, message: &str) -> Self {
        match self {
            Self::MissingParent(_) => Self::MissingParent(message.to_string()),
            other => other,
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Fields needed to insert an admin; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// UserStore
///
/// Credential store for admin accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<AdminUser>>;
    async fn find_user_by_id(&self, id: i32) -> RepoResult<Option<AdminUser>>;
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewAdminUser) -> RepoResult<AdminUser>;
    async fn touch_last_login(&self, id: i32) -> RepoResult<()>;
    async fn email_exists(&self, email: &str) -> RepoResult<bool>;
}

/// ContactStore
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Persists a submission with status `pending`.
    async fn create_contact(&self, req: &ContactRequest) -> RepoResult<ContactMessage>;
    /// Newest first.
    async fn list_contacts(&self) -> RepoResult<Vec<ContactMessage>>;
    /// `false` when no message has this id.
    async fn mark_contact_read(&self, id: i32) -> RepoResult<bool>;
    async fn delete_contact(&self, id: i32) -> RepoResult<bool>;
}

/// GalleryStore
///
/// Categories are always returned with their images, ordered by `display_order`
/// ascending then newest first.
#[async_trait]
pub trait GalleryStore: Send + Sync {
    async fn list_categories(&self) -> RepoResult<Vec<GalleryCategory>>;
    async fn find_category_by_slug(&self, slug: &str) -> RepoResult<Option<GalleryCategory>>;
    /// Fails with `Conflict` when the slug is taken.
    async fn create_category(&self, req: &CreateCategoryRequest) -> RepoResult<GalleryCategory>;
    /// Only the fields present in `req` change. `None` when the id is unknown.
    async fn update_category(
        &self,
        id: i32,
        req: &UpdateCategoryRequest,
    ) -> RepoResult<Option<GalleryCategory>>;
    /// Deletes the category and all of its images.
    async fn delete_category(&self, id: i32) -> RepoResult<bool>;
    /// Fails with `MissingParent` when the category does not exist.
    async fn create_image(
        &self,
        category_id: i32,
        req: &CreateImageRequest,
    ) -> RepoResult<GalleryImage>;
    async fn delete_image(&self, id: i32) -> RepoResult<bool>;
}

/// PortfolioStore
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn list_sections(&self) -> RepoResult<Vec<PortfolioSection>>;
    /// Stores the remote image reference. `false` when the section is unknown.
    async fn set_section_image(&self, id: i32, public_id: &str, url: &str) -> RepoResult<bool>;
}

/// Repository
///
/// Every store in one object, so `AppState` carries a single handle. Implemented for
/// anything that implements the individual stores.
pub trait Repository: UserStore + ContactStore + GalleryStore + PortfolioStore {}

impl<T> Repository for T where T: UserStore + ContactStore + GalleryStore + PortfolioStore {}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
