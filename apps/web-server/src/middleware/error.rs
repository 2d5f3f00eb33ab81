//! Error handling - HTML error pages and login redirects.

use std::fmt;
use std::time::Duration;

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpResponse, ResponseError};

use posty_core::error::{DomainError, RepoError};
use posty_core::ports::{AuthError, CacheError, MediaError};

use crate::views;

/// Application-level error type rendered as an HTML page.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    /// The action needs a logged-in user; `next` is where to come back to.
    LoginRequired { next: String },
    TooManyRequests { retry_after: Duration },
    BadRequest(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound => write!(f, "Not found"),
            AppError::LoginRequired { next } => write!(f, "Login required for {}", next),
            AppError::TooManyRequests { retry_after } => {
                write!(f, "Too many requests, retry in {}s", retry_after.as_secs())
            }
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

/// `/auth/login/?next=<path>`
pub fn login_url(next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("/auth/login/?{}", query)
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // The body is replaced by `render_not_found`, which knows the path
            AppError::NotFound => views::html(StatusCode::NOT_FOUND, views::errors::not_found("")),
            AppError::LoginRequired { next } => HttpResponse::Found()
                .insert_header((header::LOCATION, login_url(next)))
                .finish(),
            AppError::TooManyRequests { retry_after } => {
                let secs = retry_after.as_secs().max(1);
                let mut res = views::html(
                    StatusCode::TOO_MANY_REQUESTS,
                    views::errors::too_many_requests(secs),
                );
                if let Ok(value) = header::HeaderValue::from_str(&secs.to_string()) {
                    res.headers_mut().insert(header::RETRY_AFTER, value);
                }
                res
            }
            AppError::BadRequest(detail) => {
                views::html(StatusCode::BAD_REQUEST, views::errors::bad_request(detail))
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                views::html(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    views::errors::server_error(),
                )
            }
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { .. } => AppError::NotFound,
            DomainError::Validation(msg) | DomainError::Duplicate(msg) => {
                AppError::BadRequest(msg)
            }
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound,
            RepoError::Constraint(msg) => AppError::BadRequest(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidPath(_) => AppError::NotFound,
            MediaError::Io(msg) => AppError::Internal(format!("Media storage: {}", msg)),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<actix_session::SessionInsertError> for AppError {
    fn from(err: actix_session::SessionInsertError) -> Self {
        AppError::Internal(format!("Session: {}", err))
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Replace the body of every 404 and 500 response with the site's pages,
/// including responses produced outside handlers (routing misses, extractor
/// failures).
pub fn error_pages<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::NOT_FOUND, render_not_found)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, render_server_error)
}

fn render_not_found<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let path = res.request().path().to_string();
    let (req, _) = res.into_parts();
    let page = views::html(StatusCode::NOT_FOUND, views::errors::not_found(&path));
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, page).map_into_right_body(),
    ))
}

fn render_server_error<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();
    let page = views::html(
        StatusCode::INTERNAL_SERVER_ERROR,
        views::errors::server_error(),
    );
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, page).map_into_right_body(),
    ))
}
