use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    ContactStore, GalleryStore, NewAdminUser, PortfolioStore, RepoError, RepoResult, UserStore,
};
use crate::models::{
    AdminUser, ContactMessage, ContactRequest, ContactStatus, CreateCategoryRequest,
    CreateImageRequest, GalleryCategory, GalleryImage, PortfolioSection, UpdateCategoryRequest,
};

const USER_COLUMNS: &str = "id, email, password_hash, name, created_at, last_login";
const CONTACT_COLUMNS: &str =
    "id, name, email, phone, subject, message, status, created_at, updated_at";
const CATEGORY_COLUMNS: &str =
    "id, slug, title, description, cover_image, display_order, created_at, updated_at";
const IMAGE_COLUMNS: &str = "id, category_id, src, alt, aspect_ratio, display_order, created_at";
const SECTION_COLUMNS: &str = "id, name, slug, description, display_order, image_public_id, \
     image_url, created_at, updated_at";

/// PostgresRepository
///
/// The production implementation of every store, backed by a `PgPool`.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the images of one category. Called once per category by the listing,
    /// which keeps the queries simple at the cost of N+1 round trips.
    async fn images_for(&self, category_id: i32) -> RepoResult<Vec<GalleryImage>> {
        let images = sqlx::query_as::<_, GalleryImage>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM gallery_images \
             WHERE category_id = $1 \
             ORDER BY display_order ASC, created_at DESC"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    async fn with_images(&self, mut category: GalleryCategory) -> RepoResult<GalleryCategory> {
        category.images = self.images_for(category.id).await?;
        Ok(category)
    }
}

#[async_trait]
impl UserStore for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<AdminUser>> {
        let user = sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {USER_COLUMNS} FROM admin_users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i32) -> RepoResult<Option<AdminUser>> {
        let user = sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {USER_COLUMNS} FROM admin_users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewAdminUser) -> RepoResult<AdminUser> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "INSERT INTO admin_users (email, password_hash, name) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::from(e).on_conflict("Email already registered"))
    }

    async fn touch_last_login(&self, id: i32) -> RepoResult<()> {
        sqlx::query("UPDATE admin_users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admin_users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ContactStore for PostgresRepository {
    async fn create_contact(&self, req: &ContactRequest) -> RepoResult<ContactMessage> {
        let message = sqlx::query_as::<_, ContactMessage>(&format!(
            "INSERT INTO contact_messages (name, email, phone, subject, message, status) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.email)
        .bind(req.phone.as_deref())
        .bind(&req.subject)
        .bind(&req.message)
        .bind(ContactStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn list_contacts(&self) -> RepoResult<Vec<ContactMessage>> {
        let messages = sqlx::query_as::<_, ContactMessage>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn mark_contact_read(&self, id: i32) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE contact_messages SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(ContactStatus::Read.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_contact(&self, id: i32) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl GalleryStore for PostgresRepository {
    async fn list_categories(&self) -> RepoResult<Vec<GalleryCategory>> {
        let categories = sqlx::query_as::<_, GalleryCategory>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM gallery_categories \
             ORDER BY display_order ASC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut loaded = Vec::with_capacity(categories.len());
        for category in categories {
            loaded.push(self.with_images(category).await?);
        }
        Ok(loaded)
    }

    async fn find_category_by_slug(&self, slug: &str) -> RepoResult<Option<GalleryCategory>> {
        let category = sqlx::query_as::<_, GalleryCategory>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM gallery_categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        match category {
            Some(category) => Ok(Some(self.with_images(category).await?)),
            None => Ok(None),
        }
    }

    async fn create_category(&self, req: &CreateCategoryRequest) -> RepoResult<GalleryCategory> {
        sqlx::query_as::<_, GalleryCategory>(&format!(
            "INSERT INTO gallery_categories (slug, title, description, cover_image, display_order) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&req.slug)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.cover_image)
        .bind(req.display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::from(e).on_conflict("A category with this slug already exists"))
    }

    async fn update_category(
        &self,
        id: i32,
        req: &UpdateCategoryRequest,
    ) -> RepoResult<Option<GalleryCategory>> {
        let category = sqlx::query_as::<_, GalleryCategory>(&format!(
            "UPDATE gallery_categories SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                cover_image = COALESCE($4, cover_image), \
                display_order = COALESCE($5, display_order), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(req.title.as_deref())
        .bind(req.description.as_deref())
        .bind(req.cover_image.as_deref())
        .bind(req.display_order)
        .fetch_optional(&self.pool)
        .await?;

        match category {
            Some(category) => Ok(Some(self.with_images(category).await?)),
            None => Ok(None),
        }
    }

    async fn delete_category(&self, id: i32) -> RepoResult<bool> {
        // gallery_images.category_id is ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM gallery_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_image(
        &self,
        category_id: i32,
        req: &CreateImageRequest,
    ) -> RepoResult<GalleryImage> {
        sqlx::query_as::<_, GalleryImage>(&format!(
            "INSERT INTO gallery_images (category_id, src, alt, aspect_ratio, display_order) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(category_id)
        .bind(&req.src)
        .bind(&req.alt)
        .bind(req.aspect_ratio.as_str())
        .bind(req.display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::from(e).on_missing_parent("Category not found"))
    }

    async fn delete_image(&self, id: i32) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM gallery_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PortfolioStore for PostgresRepository {
    async fn list_sections(&self) -> RepoResult<Vec<PortfolioSection>> {
        let sections = sqlx::query_as::<_, PortfolioSection>(&format!(
            "SELECT {SECTION_COLUMNS} FROM portfolio_sections ORDER BY display_order ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(sections)
    }

    async fn set_section_image(&self, id: i32, public_id: &str, url: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE portfolio_sections \
             SET image_public_id = $2, image_url = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(public_id)
        .bind(url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
