use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue, Method, header},
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod compensation;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod images;
pub mod models;
pub mod notifications;
pub mod repository;
pub mod response;
pub mod storage;
pub mod validation;

// Routing segregated by access level (public, admin).
pub mod routes;
use routes::{admin, public};

// --- Public Re-exports ---

pub use auth::{PasswordState, TokenState};
pub use config::AppConfig;
pub use error::{AppError, ApiResult};
pub use images::ImageHostState;
pub use notifications::NotifierState;
pub use repository::RepositoryState;
pub use storage::StorageState;

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::login, handlers::auth::register, handlers::auth::me,
        handlers::contact::submit_contact, handlers::contact::list_contacts,
        handlers::contact::mark_contact_read, handlers::contact::delete_contact,
        handlers::gallery::list_galleries, handlers::gallery::get_gallery,
        handlers::gallery::create_gallery, handlers::gallery::update_gallery,
        handlers::gallery::delete_gallery, handlers::gallery::create_image,
        handlers::gallery::delete_image,
        handlers::portfolio::list_sections, handlers::portfolio::update_section_image,
        handlers::upload::upload_file, handlers::upload::upload_files,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            models::UserInfo, models::LoginRequest, models::LoginResponse,
            models::RegisterRequest, models::MeResponse,
            models::ContactStatus, models::ContactMessage, models::ContactRequest,
            models::AspectRatio, models::GalleryCategory, models::GalleryImage,
            models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::CreateImageRequest, models::PortfolioSection,
            models::UploadResponse, models::MultiUploadResponse,
            models::SectionImageResponse, validation::FieldError,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "portfolio-backend", description = "Portfolio CMS API")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the admin paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// The single, immutable container of every shared service, cloned into each
/// request. Each field is an `Arc` handle (or small config), so cloning is cheap.
/// Handlers take `State<AppState>`; extractors pull just the piece they need
/// through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: Postgres in production, in-memory in tests.
    pub repo: RepositoryState,
    /// Issues and verifies admin bearer tokens.
    pub tokens: TokenState,
    /// Argon2 password hashing.
    pub passwords: PasswordState,
    /// Local disk uploads.
    pub storage: StorageState,
    /// Remote image hosting for portfolio sections.
    pub images: ImageHostState,
    /// Background contact-form emails.
    pub notifier: NotifierState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenState {
    fn from_ref(app_state: &AppState) -> TokenState {
        app_state.tokens.clone()
    }
}

/// cors_layer
///
/// Only the configured frontend origin may call the API from a browser. An origin
/// that is not a valid header value falls back to allowing any origin.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin([origin]),
        Err(_) => {
            tracing::warn!(frontend_url, "invalid FRONTEND_URL, allowing any origin");
            cors.allow_origin(Any)
        }
    }
}

/// create_router
///
/// Assembles the whole routing tree, applies global and scoped middleware and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes(&config))
        .nest("/admin", admin::admin_routes(state.clone(), &config));

    let base_router = Router::new()
        // Documentation: Swagger UI plus the raw OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Liveness, outside the envelope and the /api prefix.
        .route("/health", axum::routing::get(handlers::health::health))
        .nest("/api", api)
        // Uploaded files, straight from disk.
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .with_state(state);

    // Observability and correlation layers, outermost first.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors_layer(&config.frontend_url))
}

/// trace_span_logger
///
/// Opens the per-request span with the request id, so every log line of one request
/// can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
