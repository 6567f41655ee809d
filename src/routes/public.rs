use crate::{AppState, config::AppConfig, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token, nested under `/api`. Everything here is
/// either read-only gallery data or a write that anyone may make (contact form,
/// login). Registration is only mounted when the configuration allows it.
pub fn public_routes(config: &AppConfig) -> Router<AppState> {
    let router = Router::new()
        // POST /api/contact
        // Stores the submission and queues the two notification emails.
        .route("/contact", post(handlers::contact::submit_contact))
        // GET /api/galleries
        // All categories with their images, in display order.
        .route("/galleries", get(handlers::gallery::list_galleries))
        // GET /api/galleries/{slug}
        .route("/galleries/{slug}", get(handlers::gallery::get_gallery))
        // POST /api/auth/login
        // Exchanges credentials for a bearer token.
        .route("/auth/login", post(handlers::auth::login));

    if config.allow_registration {
        tracing::warn!("admin self-registration is enabled");
        router.route("/auth/register", post(handlers::auth::register))
    } else {
        router
    }
}
