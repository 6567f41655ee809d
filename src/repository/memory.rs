use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    ContactStore, GalleryStore, NewAdminUser, PortfolioStore, RepoError, RepoResult, UserStore,
};
use crate::models::{
    AdminUser, ContactMessage, ContactRequest, ContactStatus, CreateCategoryRequest,
    CreateImageRequest, GalleryCategory, GalleryImage, PortfolioSection, UpdateCategoryRequest,
};

#[derive(Default)]
struct Tables {
    users: Vec<AdminUser>,
    contacts: Vec<ContactMessage>,
    categories: Vec<GalleryCategory>,
    images: Vec<GalleryImage>,
    sections: Vec<PortfolioSection>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn category_with_images(&self, category: &GalleryCategory) -> GalleryCategory {
        let mut images: Vec<GalleryImage> = self
            .images
            .iter()
            .filter(|image| image.category_id == category.id)
            .cloned()
            .collect();
        images.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });

        GalleryCategory {
            images,
            ..category.clone()
        }
    }
}

/// InMemoryRepository
///
/// Test double for every store. Enforces the same rules as the Postgres schema:
/// unique admin emails, unique category slugs, images require an existing category,
/// and deleting a category removes its images. `failing()` builds an instance whose
/// every call returns a database error.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    fail: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let repo = Self::default();
        repo.set_failing(true);
        repo
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Inserts a portfolio section with no image, returning its id.
    pub async fn seed_section(&self, name: &str, slug: &str, display_order: i32) -> i32 {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let now = Utc::now();
        tables.sections.push(PortfolioSection {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
            description: String::new(),
            display_order,
            image_public_id: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Every stored contact message, in insertion order.
    pub async fn contacts(&self) -> Vec<ContactMessage> {
        self.tables.read().await.contacts.clone()
    }

    /// Every stored gallery image, regardless of category.
    pub async fn images(&self) -> Vec<GalleryImage> {
        self.tables.read().await.images.clone()
    }

    fn check(&self) -> RepoResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(RepoError::Database(sqlx::Error::Protocol(
                "in-memory repository set to fail".into(),
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserStore for InMemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<AdminUser>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i32) -> RepoResult<Option<AdminUser>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewAdminUser) -> RepoResult<AdminUser> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict("Email already registered".into()));
        }

        let created = AdminUser {
            id: tables.next_id(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: Utc::now(),
            last_login: None,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn touch_last_login(&self, id: i32) -> RepoResult<()> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().any(|u| u.email == email))
    }
}

#[async_trait]
impl ContactStore for InMemoryRepository {
    async fn create_contact(&self, req: &ContactRequest) -> RepoResult<ContactMessage> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let message = ContactMessage {
            id: tables.next_id(),
            name: req.name.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            subject: req.subject.clone(),
            message: req.message.clone(),
            status: ContactStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.contacts.push(message.clone());
        Ok(message)
    }

    async fn list_contacts(&self) -> RepoResult<Vec<ContactMessage>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut messages = tables.contacts.clone();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn mark_contact_read(&self, id: i32) -> RepoResult<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        match tables.contacts.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.status = ContactStatus::Read;
                message.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_contact(&self, id: i32) -> RepoResult<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.contacts.len();
        tables.contacts.retain(|m| m.id != id);
        Ok(tables.contacts.len() < before)
    }
}

#[async_trait]
impl GalleryStore for InMemoryRepository {
    async fn list_categories(&self) -> RepoResult<Vec<GalleryCategory>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut categories: Vec<GalleryCategory> = tables
            .categories
            .iter()
            .map(|c| tables.category_with_images(c))
            .collect();
        categories.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(categories)
    }

    async fn find_category_by_slug(&self, slug: &str) -> RepoResult<Option<GalleryCategory>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .map(|c| tables.category_with_images(c)))
    }

    async fn create_category(&self, req: &CreateCategoryRequest) -> RepoResult<GalleryCategory> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.slug == req.slug) {
            return Err(RepoError::Conflict(
                "A category with this slug already exists".into(),
            ));
        }

        let now = Utc::now();
        let category = GalleryCategory {
            id: tables.next_id(),
            slug: req.slug.clone(),
            title: req.title.clone(),
            description: req.description.clone(),
            cover_image: req.cover_image.clone(),
            display_order: req.display_order,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: i32,
        req: &UpdateCategoryRequest,
    ) -> RepoResult<Option<GalleryCategory>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(title) = &req.title {
            category.title = title.clone();
        }
        if let Some(description) = &req.description {
            category.description = description.clone();
        }
        if let Some(cover_image) = &req.cover_image {
            category.cover_image = cover_image.clone();
        }
        if let Some(display_order) = req.display_order {
            category.display_order = display_order;
        }
        category.updated_at = Utc::now();

        let updated = category.clone();
        Ok(Some(tables.category_with_images(&updated)))
    }

    async fn delete_category(&self, id: i32) -> RepoResult<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        if tables.categories.len() == before {
            return Ok(false);
        }
        tables.images.retain(|image| image.category_id != id);
        Ok(true)
    }

    async fn create_image(
        &self,
        category_id: i32,
        req: &CreateImageRequest,
    ) -> RepoResult<GalleryImage> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if !tables.categories.iter().any(|c| c.id == category_id) {
            return Err(RepoError::MissingParent("Category not found".into()));
        }

        let image = GalleryImage {
            id: tables.next_id(),
            category_id,
            src: req.src.clone(),
            alt: req.alt.clone(),
            aspect_ratio: req.aspect_ratio,
            display_order: req.display_order,
            created_at: Utc::now(),
        };
        tables.images.push(image.clone());
        Ok(image)
    }

    async fn delete_image(&self, id: i32) -> RepoResult<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.images.len();
        tables.images.retain(|image| image.id != id);
        Ok(tables.images.len() < before)
    }
}

#[async_trait]
impl PortfolioStore for InMemoryRepository {
    async fn list_sections(&self) -> RepoResult<Vec<PortfolioSection>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut sections = tables.sections.clone();
        sections.sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.id.cmp(&b.id)));
        Ok(sections)
    }

    async fn set_section_image(&self, id: i32, public_id: &str, url: &str) -> RepoResult<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        match tables.sections.iter_mut().find(|s| s.id == id) {
            Some(section) => {
                section.image_public_id = Some(public_id.to_string());
                section.image_url = Some(url.to_string());
                section.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
