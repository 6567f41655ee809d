#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use portfolio_backend::{
    AppConfig, AppState, create_router,
    auth::{Argon2Hasher, PasswordHasher, PasswordState, TokenService},
    images::MockImageHost,
    models::AdminUser,
    notifications::{NotifierState, RecordingNotifier},
    repository::{InMemoryRepository, NewAdminUser, UserStore},
    storage::LocalDiskStorage,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "owner@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";
pub const TEST_SECRET: &str = "integration-test-secret";

/// A fully wired router over in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub config: AppConfig,
    pub repo: Arc<InMemoryRepository>,
    pub images: Arc<MockImageHost>,
    pub notifier: Arc<RecordingNotifier>,
    pub tokens: Arc<TokenService>,
    pub upload_dir: TempDir,
}

pub struct TestAppBuilder {
    config: AppConfig,
    repo: InMemoryRepository,
    images: MockImageHost,
    notifier: Option<NotifierState>,
    passwords: Option<PasswordState>,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            config: AppConfig {
                jwt_secret: TEST_SECRET.to_string(),
                jwt_expiration: Duration::from_secs(24 * 60 * 60),
                ..AppConfig::default()
            },
            repo: InMemoryRepository::new(),
            images: MockImageHost::new(),
            notifier: None,
            passwords: None,
        }
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            raw: bytes.to_vec(),
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(request("GET", path, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(request("DELETE", path, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(request("PATCH", path, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(
        &self,
        method: &str,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> TestResponse {
        self.send(
            request(method, path, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn multipart(
        &self,
        method: &str,
        path: &str,
        parts: &[FilePart<'_>],
        token: Option<&str>,
    ) -> TestResponse {
        let (content_type, body) = multipart_body(parts);
        self.send(
            request(method, path, token)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Inserts the default admin account.
    pub async fn seed_admin(&self) -> AdminUser {
        let password_hash = Argon2Hasher::new().hash(ADMIN_PASSWORD).unwrap();
        self.repo
            .create_user(NewAdminUser {
                email: ADMIN_EMAIL.to_string(),
                password_hash,
                name: "Site Owner".to_string(),
            })
            .await
            .unwrap()
    }

    /// A valid bearer token for an admin, without going through the login endpoint.
    pub fn admin_token(&self) -> String {
        self.tokens.issue(1, ADMIN_EMAIL).unwrap().token
    }

    /// Names of the files currently in the upload directory.
    pub fn stored_files(&self) -> Vec<String> {
        std::fs::read_dir(self.upload_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

impl TestAppBuilder {
    pub fn config(mut self, edit: impl FnOnce(&mut AppConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn repo(mut self, repo: InMemoryRepository) -> Self {
        self.repo = repo;
        self
    }

    pub fn images(mut self, images: MockImageHost) -> Self {
        self.images = images;
        self
    }

    /// Replaces the recording notifier (which stays in `TestApp` but sees nothing).
    pub fn notifier(mut self, notifier: NotifierState) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn passwords(mut self, passwords: PasswordState) -> Self {
        self.passwords = Some(passwords);
        self
    }

    pub async fn build(self) -> TestApp {
        let upload_dir = tempfile::tempdir().unwrap();
        let mut config = self.config;
        config.upload_dir = upload_dir.path().to_string_lossy().into_owned();

        let repo = Arc::new(self.repo);
        let images = Arc::new(self.images);
        let recording = Arc::new(RecordingNotifier::new());
        let notifier: NotifierState = match self.notifier {
            Some(notifier) => notifier,
            None => recording.clone(),
        };
        let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.jwt_expiration));
        let storage = LocalDiskStorage::new(upload_dir.path(), config.max_file_size)
            .await
            .unwrap();

        let state = AppState {
            repo: repo.clone(),
            tokens: tokens.clone(),
            passwords: match self.passwords {
                Some(passwords) => passwords,
                None => Arc::new(Argon2Hasher::new()),
            },
            storage: Arc::new(storage),
            images: images.clone(),
            notifier,
            config: config.clone(),
        };

        TestApp {
            router: create_router(state),
            config,
            repo,
            images,
            notifier: recording,
            tokens,
            upload_dir,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestResponse {
    /// Field names of the envelope's `errors` array, in response order.
    pub fn error_fields(&self) -> Vec<String> {
        self.body["errors"]
            .as_array()
            .map(|errors| {
                errors
                    .iter()
                    .map(|e| e["field"].as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn request(method: &str, path: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(path);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// One file inside a multipart body.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: Vec<u8>,
}

impl<'a> FilePart<'a> {
    pub fn jpeg(field: &'a str, file_name: &'a str, size: usize) -> Self {
        Self {
            field,
            file_name,
            content_type: "image/jpeg",
            bytes: vec![0xAB; size],
        }
    }
}

pub fn multipart_body(parts: &[FilePart<'_>]) -> (String, Vec<u8>) {
    let boundary = "----portfolio-test-boundary";
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.field, part.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(&part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
