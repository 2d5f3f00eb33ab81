//! Author profiles and following.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

use posty_core::domain::{PostFilter, User};

use super::{PageQuery, redirect};
use crate::listing;
use crate::middleware::auth::{CurrentUser, Viewer};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::{self, profiles::ProfileView};

async fn find_author(state: &AppState, username: &str) -> AppResult<User> {
    state
        .users
        .find_by_username(username)
        .await?
        .ok_or(AppError::NotFound)
}

fn profile_url(author: &User) -> String {
    format!("/{}/", author.username)
}

/// GET /{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state, &username).await?;

    let posts =
        listing::post_page(&state, PostFilter::Author(author.id), query.into_inner().page).await?;
    let post_count = state.posts.count_by_author(author.id).await?;
    let follower_count = state.follows.count_followers(author.id).await?;
    let following_count = state.follows.count_following(author.id).await?;

    let following = match viewer.id() {
        Some(id) if id != author.id => Some(state.follows.is_following(id, author.id).await?),
        _ => None,
    };

    let body = views::profiles::profile(
        viewer.user(),
        &ProfileView {
            author: &author,
            post_count,
            follower_count,
            following_count,
            following,
            posts: &posts,
        },
    );
    Ok(views::html(StatusCode::OK, body))
}

/// GET /{username}/follow/
pub async fn follow(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    username: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state, &username).await?;

    if author.id == user.id {
        tracing::debug!(user = %user.username, "Ignoring self-follow");
    } else if state.follows.follow(user.id, author.id).await? {
        tracing::info!(user = %user.username, author = %author.username, "Followed");
    }

    Ok(redirect(&profile_url(&author)))
}

/// GET /{username}/unfollow/
pub async fn unfollow(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    username: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state, &username).await?;

    if state.follows.unfollow(user.id, author.id).await? {
        tracing::info!(user = %user.username, author = %author.username, "Unfollowed");
    }

    Ok(redirect(&profile_url(&author)))
}
