//! Post listings, the post page, the post form and comments.

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use uuid::Uuid;

use posty_core::domain::{Comment, Post, PostFilter, User};
use posty_core::ports::BaseRepository;
use posty_shared::dto::{CommentForm, PostForm};
use posty_shared::form::INVALID_CHOICE;
use posty_shared::{FormErrors, validate_image};

use super::multipart::{PostParts, read_post_form};
use super::{PageQuery, redirect};
use crate::listing::{self, PostCard};
use crate::middleware::auth::{CurrentUser, Viewer};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::{self, posts::PostDetail, posts::PostFormView};

/// Cache key of one rendered index page. The page embeds the viewer's
/// navigation, so each viewer gets their own entry.
pub fn index_cache_key(viewer: Option<Uuid>, page: Option<&str>) -> String {
    let viewer = viewer.map_or_else(|| "anon".to_string(), |id| id.to_string());
    let page = page.map(str::trim).filter(|p| !p.is_empty()).unwrap_or("1");
    format!("index_page:{}:{}", viewer, page)
}

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let key = index_cache_key(viewer.id(), query.page.as_deref());
    if let Some(body) = state.cache.get(&key).await {
        tracing::debug!(%key, "Index page served from cache");
        return Ok(views::html(StatusCode::OK, body));
    }

    let page = listing::post_page(&state, PostFilter::All, query.into_inner().page).await?;
    let body = views::posts::index(viewer.user(), &page);

    if let Err(e) = state
        .cache
        .set(&key, &body, Some(state.settings.index_cache_ttl))
        .await
    {
        tracing::warn!("Failed to cache index page: {}", e);
    }
    Ok(views::html(StatusCode::OK, body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    viewer: Viewer,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let group = state
        .groups
        .find_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound)?;

    let page =
        listing::post_page(&state, PostFilter::Group(group.id), query.into_inner().page).await?;
    Ok(views::html(
        StatusCode::OK,
        views::posts::group(viewer.user(), &group, &page),
    ))
}

/// GET /follow/
pub async fn follow_index(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page =
        listing::post_page(&state, PostFilter::FollowedBy(user.id), query.into_inner().page)
            .await?;
    Ok(views::html(
        StatusCode::OK,
        views::posts::follow(Some(&user), &page),
    ))
}

/// Resolve `/{username}/{post_id}/`: the post must exist and belong to
/// `username`.
async fn find_post(state: &AppState, username: &str, post_id: &str) -> AppResult<(User, Post)> {
    let post_id = Uuid::parse_str(post_id).map_err(|_| AppError::NotFound)?;
    let author = state
        .users
        .find_by_username(username)
        .await?
        .ok_or(AppError::NotFound)?;
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .filter(|post| post.author_id == author.id)
        .ok_or(AppError::NotFound)?;
    Ok((author, post))
}

fn post_url(author: &User, post: &Post) -> String {
    format!("/{}/{}/", author.username, post.id)
}

/// GET /{username}/{post_id}/
pub async fn post_view(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let (author, post) = find_post(&state, &username, &post_id).await?;

    let group = match post.group_id {
        Some(id) => state.groups.find_by_id(id).await?,
        None => None,
    };
    let author_post_count = state.posts.count_by_author(author.id).await?;
    let comments = listing::comments_for(&state, post.id).await?;
    let can_edit = viewer.is(&author);

    let card = PostCard {
        post,
        author,
        group,
    };
    let body = views::posts::detail(
        viewer.user(),
        &PostDetail {
            card: &card,
            author_post_count,
            comments: &comments,
            can_edit,
        },
    );
    Ok(views::html(StatusCode::OK, body))
}

/// A post form that passed validation.
struct PostSubmission {
    text: String,
    group_id: Option<Uuid>,
    /// Validated upload and the extension to store it under.
    image: Option<(Vec<u8>, String)>,
    clear_image: bool,
}

/// What to show when a post form is redisplayed.
struct RejectedPost {
    text: String,
    group: Option<Uuid>,
    errors: FormErrors,
}

/// Ticking "clear" while uploading a new file.
const CLEAR_AND_UPLOAD: &str =
    "Please either submit a file or check the clear checkbox, not both.";

/// Validate a submitted post form, including the group lookup and the image
/// checks.
async fn clean_post_form(
    state: &AppState,
    parts: PostParts,
) -> AppResult<Result<PostSubmission, RejectedPost>> {
    let PostParts {
        form,
        upload,
        mut errors,
    } = parts;
    let raw_text = form.text.clone();
    let raw_group = Uuid::parse_str(form.group.trim()).ok();
    let wants_clear = form.image_clear;

    let cleaned = match form.clean() {
        Ok(cleaned) => Some(cleaned),
        Err(e) => {
            errors.merge(e);
            None
        }
    };

    // Checked even when the text is rejected, so every problem shows at once
    if let Some(group_id) = raw_group {
        if state.groups.find_by_id(group_id).await?.is_none() {
            errors.add("group", INVALID_CHOICE);
        }
    }

    if upload.is_some() && wants_clear {
        errors.add("image", CLEAR_AND_UPLOAD);
    }

    let image = match upload {
        Some(upload) => match validate_image(&upload, state.settings.max_upload_bytes) {
            Ok(extension) => Some((upload.bytes, extension)),
            Err(e) => {
                tracing::debug!(filename = %upload.filename, "Rejected post image: {}", e);
                errors.add("image", e.to_string());
                None
            }
        },
        None => None,
    };

    match cleaned {
        Some((form, group_id)) if errors.is_empty() => Ok(Ok(PostSubmission {
            text: form.text,
            group_id,
            image,
            clear_image: form.image_clear,
        })),
        _ => Ok(Err(RejectedPost {
            text: raw_text,
            group: raw_group,
            errors,
        })),
    }
}

/// Remove a freshly stored image whose post could not be saved.
async fn discard_image(state: &AppState, path: &str) {
    if let Err(e) = state.media.remove(path).await {
        tracing::warn!(%path, "Failed to remove unsaved image: {}", e);
    }
}

/// GET /new/
pub async fn new_post_form(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<HttpResponse> {
    let groups = state.groups.list_all().await?;
    let body = views::posts::form(
        Some(&user),
        &PostFormView {
            editing: None,
            text: "",
            group: None,
            groups: &groups,
            errors: &FormErrors::new(),
        },
    );
    Ok(views::html(StatusCode::OK, body))
}

/// POST /new/
pub async fn new_post(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let parts = read_post_form(payload, state.settings.max_upload_bytes).await?;

    let submission = match clean_post_form(&state, parts).await? {
        Ok(submission) => submission,
        Err(rejected) => {
            let groups = state.groups.list_all().await?;
            let body = views::posts::form(
                Some(&user),
                &PostFormView {
                    editing: None,
                    text: &rejected.text,
                    group: rejected.group,
                    groups: &groups,
                    errors: &rejected.errors,
                },
            );
            return Ok(views::html(StatusCode::OK, body));
        }
    };

    let image = match &submission.image {
        Some((bytes, extension)) => Some(state.media.store(bytes, extension).await?),
        None => None,
    };
    let post = Post::new(user.id, submission.text, submission.group_id).with_image(image.clone());
    let post = match state.posts.insert(post).await {
        Ok(post) => post,
        Err(e) => {
            if let Some(path) = &image {
                discard_image(&state, path).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(post_id = %post.id, author = %user.username, "Post created");
    Ok(redirect("/"))
}

/// GET /{username}/{post_id}/edit/
pub async fn post_edit_form(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let (author, post) = find_post(&state, &username, &post_id).await?;
    if author.id != user.id {
        return Ok(redirect(&post_url(&author, &post)));
    }

    let groups = state.groups.list_all().await?;
    let body = views::posts::form(
        Some(&user),
        &PostFormView {
            editing: Some((&author, &post)),
            text: &post.text,
            group: post.group_id,
            groups: &groups,
            errors: &FormErrors::new(),
        },
    );
    Ok(views::html(StatusCode::OK, body))
}

/// POST /{username}/{post_id}/edit/
pub async fn post_edit(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<(String, String)>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let (author, mut post) = find_post(&state, &username, &post_id).await?;
    if author.id != user.id {
        return Ok(redirect(&post_url(&author, &post)));
    }

    let parts = read_post_form(payload, state.settings.max_upload_bytes).await?;
    let submission = match clean_post_form(&state, parts).await? {
        Ok(submission) => submission,
        Err(rejected) => {
            let groups = state.groups.list_all().await?;
            let body = views::posts::form(
                Some(&user),
                &PostFormView {
                    editing: Some((&author, &post)),
                    text: &rejected.text,
                    group: rejected.group,
                    groups: &groups,
                    errors: &rejected.errors,
                },
            );
            return Ok(views::html(StatusCode::OK, body));
        }
    };

    let previous_image = post.image.clone();
    let stored = match &submission.image {
        Some((bytes, extension)) => Some(state.media.store(bytes, extension).await?),
        None => None,
    };
    post.image = match &stored {
        Some(path) => Some(path.clone()),
        None if submission.clear_image => None,
        None => previous_image.clone(),
    };
    post.text = submission.text;
    post.group_id = submission.group_id;

    let post = match state.posts.update(post).await {
        Ok(post) => post,
        Err(e) => {
            if let Some(path) = &stored {
                discard_image(&state, path).await;
            }
            return Err(e.into());
        }
    };

    if let Some(old) = previous_image.filter(|old| post.image.as_ref() != Some(old)) {
        if let Err(e) = state.media.remove(&old).await {
            tracing::warn!(path = %old, "Failed to remove replaced image: {}", e);
        }
    }

    tracing::info!(post_id = %post.id, "Post updated");
    Ok(redirect(&post_url(&author, &post)))
}

/// POST /{username}/{post_id}/comment/
///
/// An empty comment is dropped silently; the viewer lands back on the post
/// either way.
pub async fn add_comment(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<(String, String)>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let (author, post) = find_post(&state, &username, &post_id).await?;

    match form.into_inner().clean() {
        Ok(form) => {
            let comment = state
                .comments
                .insert(Comment::new(post.id, user.id, form.text))
                .await?;
            tracing::debug!(comment_id = %comment.id, post_id = %post.id, "Comment added");
        }
        Err(errors) => {
            tracing::debug!(?errors, "Comment rejected");
        }
    }

    Ok(redirect(&post_url(&author, &post)))
}
