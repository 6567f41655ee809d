use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{config::AppConfig, storage::UploadedFile, validation::generate_slug};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const THUMBNAIL_TRANSFORMATION: &str = "c_fill,w_400,h_300,q_auto";

#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("image host credentials are not configured")]
    NotConfigured,

    #[error("image host request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("image host rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("simulated image host failure")]
    Simulated,
}

/// The remote reference of an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub public_id: String,
    pub secure_url: String,
    pub thumbnail_url: String,
}

/// ImageHost
///
/// Remote image hosting used for portfolio section images. The trait is the seam
/// between the handler and the network so tests never leave the process.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, file: UploadedFile) -> Result<UploadedImage, ImageHostError>;
    async fn delete(&self, public_id: &str) -> Result<(), ImageHostError>;
}

pub type ImageHostState = Arc<dyn ImageHost>;

/// Thumbnail URL derived from a public id, without a round trip.
pub fn thumbnail_url(cloud_name: &str, public_id: &str) -> String {
    format!("https://res.cloudinary.com/{cloud_name}/image/upload/{THUMBNAIL_TRANSFORMATION}/{public_id}")
}

/// sign
///
/// Request signature: parameters sorted by name, joined as `k=v&k=v`, the API secret
/// appended, then SHA-256 in lowercase hex.
pub fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Public id for an upload: the slugged file stem plus a short random suffix so two
/// uploads named `cover.jpg` never overwrite each other.
fn public_id_for(file_name: &str) -> String {
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];

    match generate_slug(stem) {
        slug if slug.is_empty() => suffix.to_string(),
        slug => format!("{slug}-{suffix}"),
    }
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// CloudinaryClient
///
/// Talks to the Cloudinary upload API over plain HTTPS with signed requests.
#[derive(Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

impl CloudinaryClient {
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str, folder: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            folder: folder.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.cloudinary_cloud_name,
            &config.cloudinary_api_key,
            &config.cloudinary_api_secret,
            &config.cloudinary_folder,
        )
    }

    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.cloud_name)
    }

    fn timestamp() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
            .to_string()
    }

    /// Adds the credentials and signature to a set of signed parameters.
    fn signed_form(&self, params: BTreeMap<&str, String>) -> Form {
        let signature = sign(&params, &self.api_secret);
        params
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key.to_string(), value))
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn rejected(response: reqwest::Response) -> ImageHostError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorReply>().await {
            Ok(reply) => reply.error.message,
            Err(_) => "unreadable error body".to_string(),
        };
        ImageHostError::Rejected { status, message }
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, file: UploadedFile) -> Result<UploadedImage, ImageHostError> {
        if !self.is_configured() {
            return Err(ImageHostError::NotConfigured);
        }

        let mut params = BTreeMap::new();
        params.insert("folder", self.folder.clone());
        params.insert("public_id", public_id_for(&file.file_name));
        params.insert("timestamp", Self::timestamp());
        params.insert("transformation", "q_auto,f_auto".to_string());

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;
        let form = self.signed_form(params).part("file", part);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let reply: UploadReply = response.json().await?;
        tracing::info!(public_id = %reply.public_id, "uploaded image to remote host");

        Ok(UploadedImage {
            thumbnail_url: thumbnail_url(&self.cloud_name, &reply.public_id),
            public_id: reply.public_id,
            secure_url: reply.secure_url,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), ImageHostError> {
        if !self.is_configured() {
            return Err(ImageHostError::NotConfigured);
        }

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("timestamp", Self::timestamp());

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .multipart(self.signed_form(params))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        tracing::info!(public_id, "deleted image from remote host");
        Ok(())
    }
}

/// MockImageHost
///
/// In-process `ImageHost` for tests. Records every upload and delete and can be told
/// to fail either operation.
#[derive(Default)]
pub struct MockImageHost {
    pub fail_upload: bool,
    pub fail_delete: bool,
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_upload() -> Self {
        Self {
            fail_upload: true,
            ..Self::default()
        }
    }

    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::default()
        }
    }

    pub async fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().await.clone()
    }

    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload(&self, file: UploadedFile) -> Result<UploadedImage, ImageHostError> {
        if self.fail_upload {
            return Err(ImageHostError::Simulated);
        }
        let public_id = format!("mock/{}", public_id_for(&file.file_name));
        self.uploaded.lock().await.push(public_id.clone());

        Ok(UploadedImage {
            secure_url: format!("https://images.test/{public_id}"),
            thumbnail_url: thumbnail_url("mock", &public_id),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), ImageHostError> {
        self.deleted.lock().await.push(public_id.to_string());
        if self.fail_delete {
            return Err(ImageHostError::Simulated);
        }
        Ok(())
    }
}
