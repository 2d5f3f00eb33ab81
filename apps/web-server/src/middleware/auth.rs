//! Session identity extractors.
//!
//! The session cookie only stores the user id; the user row is loaded per
//! request so a deleted account is logged out on its next request.

use actix_session::{Session, SessionExt};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use posty_core::domain::User;
use posty_core::ports::BaseRepository;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Session key holding the logged-in user's id.
pub const SESSION_USER_KEY: &str = "user_id";

/// The (possibly anonymous) user making the request.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }

    /// Whether the viewer is `user`.
    pub fn is(&self, user: &User) -> bool {
        self.id() == Some(user.id)
    }
}

impl FromRequest for Viewer {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.get_session();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                AppError::Internal("AppState not found in app data".to_string())
            })?;

            let user_id = match session.get::<Uuid>(SESSION_USER_KEY) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Discarding unreadable session: {}", e);
                    session.purge();
                    None
                }
            };
            let Some(user_id) = user_id else {
                return Ok(Viewer(None));
            };

            let user = state.users.find_by_id(user_id).await?;
            if user.is_none() {
                tracing::debug!(%user_id, "Session user no longer exists");
                session.purge();
            }
            Ok(Viewer(user))
        })
    }
}

/// A logged-in user. Extraction fails with a redirect to the login page
/// that returns to the current URL.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let next = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string());
        let viewer = Viewer::from_request(req, payload);

        Box::pin(async move {
            match viewer.await?.0 {
                Some(user) => Ok(CurrentUser(user)),
                None => Err(AppError::LoginRequired { next }),
            }
        })
    }
}

/// Bind the session to `user_id`, rotating the session key.
pub fn log_in(session: &Session, user_id: Uuid) -> Result<(), AppError> {
    session.renew();
    session.insert(SESSION_USER_KEY, user_id)?;
    Ok(())
}

pub fn log_out(session: &Session) {
    session.purge();
}

/// Accept `next` only when it is a local absolute path.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path
        }
        _ => "/",
    }
}
