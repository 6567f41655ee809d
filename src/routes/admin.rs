use crate::{AppState, auth::require_admin, config::AppConfig, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
};

/// Room for multipart boundaries and headers on top of the file bytes.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Admin Router Module
///
/// Every route here is wrapped in the `require_admin` route layer: a request without
/// a valid bearer token is answered with 401 before any handler runs. Nested under
/// `/api/admin` by `create_router`.
///
/// Upload routes raise axum's default body limit just enough for their payload; the
/// per-file ceiling itself is enforced while the multipart stream is read.
pub fn admin_routes(state: AppState, config: &AppConfig) -> Router<AppState> {
    let single_limit = config.max_file_size.saturating_add(MULTIPART_OVERHEAD);
    let multi_limit = config
        .max_file_size
        .saturating_mul(config.max_upload_files.max(1))
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        // GET /api/admin/me
        .route("/me", get(handlers::auth::me))
        // Contact inbox.
        .route("/contacts", get(handlers::contact::list_contacts))
        .route(
            "/contacts/{id}/read",
            patch(handlers::contact::mark_contact_read),
        )
        .route("/contacts/{id}", delete(handlers::contact::delete_contact))
        // Portfolio sections. The image goes to the remote image host.
        .route(
            "/portfolio/sections",
            get(handlers::portfolio::list_sections),
        )
        .route(
            "/portfolio/sections/{id}/image",
            put(handlers::portfolio::update_section_image)
                .layer(DefaultBodyLimit::max(single_limit)),
        )
        // Gallery management. Slugs are fixed at creation.
        .route("/galleries", post(handlers::gallery::create_gallery))
        .route(
            "/galleries/{id}",
            put(handlers::gallery::update_gallery).delete(handlers::gallery::delete_gallery),
        )
        .route(
            "/galleries/{id}/images",
            post(handlers::gallery::create_image),
        )
        .route("/images/{id}", delete(handlers::gallery::delete_image))
        // Local disk uploads, served back under /uploads.
        .route(
            "/upload",
            post(handlers::upload::upload_file).layer(DefaultBodyLimit::max(single_limit)),
        )
        .route(
            "/upload/multiple",
            post(handlers::upload::upload_files).layer(DefaultBodyLimit::max(multi_limit)),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
