//! # ma-api
//!
//! The HTTP routing layer for MyAccess.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Base64 image bodies are much larger than actix's 32 KiB JSON default.
pub const JSON_LIMIT: usize = 16 * 1024 * 1024;

/// Configures the place and user routes.
///
/// Scoped so the binary can mount the API under another prefix if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(JSON_LIMIT)).service(
        web::scope("")
            .route("/places", web::get().to(handlers::list_places))
            .route("/places", web::post().to(handlers::create_place))
            .route("/places/{id}", web::get().to(handlers::get_place))
            .route("/places/{id}/votes", web::post().to(handlers::vote))
            .route("/places/{id}/features", web::post().to(handlers::add_feature))
            .route("/places/{id}/comments", web::post().to(handlers::add_comment))
            .route("/users", web::post().to(handlers::create_user))
            .route("/users/{id}", web::get().to(handlers::get_user))
            .route("/me/contributions", web::post().to(handlers::add_contribution))
            .route("/me/liked-posts", web::post().to(handlers::add_liked_post)),
    );
}
