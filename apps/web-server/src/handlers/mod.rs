//! HTTP handlers and route configuration.

mod auth;
mod health;
mod media;
mod multipart;
mod posts;
mod profiles;

#[cfg(test)]
mod tests;

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::middleware::error::AppError;

/// `?page=N` on every listing.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Fallback for every unmatched route.
pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}

/// Configure all application routes.
///
/// Fixed prefixes are registered before the `/{username}/...` patterns,
/// which would otherwise capture them.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health::health_check))
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(auth::signup_form))
                        .route(web::post().to(auth::signup)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .service(
                    web::resource("/logout/")
                        .route(web::get().to(auth::logout))
                        .route(web::post().to(auth::logout)),
                ),
        )
        .route("/media/{path:.*}", web::get().to(media::serve))
        .route("/", web::get().to(posts::index))
        .service(
            web::resource("/new/")
                .route(web::get().to(posts::new_post_form))
                .route(web::post().to(posts::new_post)),
        )
        .route("/follow/", web::get().to(posts::follow_index))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/{username}/", web::get().to(profiles::profile))
        .route("/{username}/follow/", web::get().to(profiles::follow))
        .route("/{username}/unfollow/", web::get().to(profiles::unfollow))
        .route("/{username}/{post_id}/", web::get().to(posts::post_view))
        .service(
            web::resource("/{username}/{post_id}/edit/")
                .route(web::get().to(posts::post_edit_form))
                .route(web::post().to(posts::post_edit)),
        )
        .route(
            "/{username}/{post_id}/comment/",
            web::post().to(posts::add_comment),
        );
}
