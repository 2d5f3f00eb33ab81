//! Signup, login and logout.

use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use posty_core::domain::User;
use posty_core::error::RepoError;
use posty_core::ports::BaseRepository;
use posty_shared::FormErrors;
use posty_shared::dto::{LoginForm, SignupForm};

use super::redirect;
use crate::middleware::auth::{log_in, log_out, safe_next};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views;

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// GET /auth/signup/
pub async fn signup_form() -> HttpResponse {
    views::html(
        StatusCode::OK,
        views::auth::signup("", "", &FormErrors::new()),
    )
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    form: web::Form<SignupForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let (raw_username, raw_email) = (form.username.clone(), form.email.clone());

    let mut errors = FormErrors::new();
    let cleaned = match form.clean() {
        Ok(cleaned) => Some(cleaned),
        Err(e) => {
            errors.merge(e);
            None
        }
    };

    if let Some(form) = &cleaned {
        if state.users.find_by_username(&form.username).await?.is_some() {
            errors.add("username", USERNAME_TAKEN);
        }
    }

    let form = match cleaned {
        Some(form) if errors.is_empty() => form,
        _ => {
            return Ok(views::html(
                StatusCode::OK,
                views::auth::signup(&raw_username, &raw_email, &errors),
            ));
        }
    };

    let password_hash = state.passwords.hash(&form.password1)?;
    let user = User::new(form.username, form.email, password_hash);
    match state.users.insert(user).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
            Ok(redirect("/auth/login/"))
        }
        // Lost a race with a concurrent signup for the same name
        Err(RepoError::Constraint(_)) => {
            errors.add("username", USERNAME_TAKEN);
            Ok(views::html(
                StatusCode::OK,
                views::auth::signup(&raw_username, &raw_email, &errors),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login form body: the credentials plus the hidden `next` field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginSubmission {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    views::html(
        StatusCode::OK,
        views::auth::login("", query.next.as_deref(), &FormErrors::new()),
    )
}

/// POST /auth/login/
///
/// Attempts are throttled per client address. The limiter fails open: a
/// backend error lets the attempt through.
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    session: Session,
    form: web::Form<LoginSubmission>,
) -> AppResult<HttpResponse> {
    let client = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    match state.login_limiter.check(&format!("login:{}", client)).await {
        Ok(result) if !result.allowed => {
            tracing::warn!(%client, "Login rate limit exceeded");
            return Err(AppError::TooManyRequests {
                retry_after: result.reset_after,
            });
        }
        Ok(_) => {}
        Err(e) => tracing::error!("Rate limiter error: {}", e),
    }

    let LoginSubmission {
        username,
        password,
        next,
    } = form.into_inner();
    let raw_username = username.clone();

    let mut errors = match (LoginForm { username, password }).clean() {
        Ok(form) => {
            if let Some(user) = authenticate(&state, &form).await? {
                log_in(&session, user.id)?;
                tracing::info!(user_id = %user.id, "User logged in");
                return Ok(redirect(safe_next(next.as_deref())));
            }
            FormErrors::new()
        }
        Err(errors) => errors,
    };
    if errors.is_empty() {
        errors.add_non_field(BAD_CREDENTIALS);
    }

    Ok(views::html(
        StatusCode::OK,
        views::auth::login(&raw_username, next.as_deref(), &errors),
    ))
}

async fn authenticate(state: &AppState, form: &LoginForm) -> AppResult<Option<User>> {
    let Some(user) = state.users.find_by_username(&form.username).await? else {
        return Ok(None);
    };
    if state.passwords.verify(&form.password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// GET|POST /auth/logout/
pub async fn logout(session: Session) -> HttpResponse {
    log_out(&session);
    redirect("/")
}
