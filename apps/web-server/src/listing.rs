//! Joining posts with their authors and groups for display.

use std::collections::HashMap;

use uuid::Uuid;

use posty_core::domain::{Comment, Group, Page, PageRequest, Post, PostFilter, User};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// A post with everything its card shows.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

/// A comment with its author.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub author: User,
}

fn unique<I: IntoIterator<Item = Uuid>>(ids: I) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn users_by_id(state: &AppState, ids: Vec<Uuid>) -> AppResult<HashMap<Uuid, User>> {
    Ok(state
        .users
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

/// Attach authors and groups to a page of posts, two queries per page.
pub async fn hydrate(state: &AppState, page: Page<Post>) -> AppResult<Page<PostCard>> {
    let authors = users_by_id(state, unique(page.items.iter().map(|p| p.author_id))).await?;
    let group_ids = unique(page.items.iter().filter_map(|p| p.group_id));
    let groups: HashMap<Uuid, Group> = state
        .groups
        .find_by_ids(&group_ids)
        .await?
        .into_iter()
        .map(|g| (g.id, g))
        .collect();

    let Page {
        items,
        number,
        num_pages,
        total_items,
        per_page,
    } = page;

    let mut cards = Vec::with_capacity(items.len());
    for post in items {
        let author = authors.get(&post.author_id).cloned().ok_or_else(|| {
            AppError::Internal(format!("author {} of post {} missing", post.author_id, post.id))
        })?;
        let group = post.group_id.and_then(|id| groups.get(&id).cloned());
        cards.push(PostCard {
            post,
            author,
            group,
        });
    }

    Ok(Page {
        items: cards,
        number,
        num_pages,
        total_items,
        per_page,
    })
}

/// Load and hydrate one page of `filter`.
pub async fn post_page(
    state: &AppState,
    filter: PostFilter,
    requested: Option<String>,
) -> AppResult<Page<PostCard>> {
    let request = PageRequest::new(requested, state.settings.page_size);
    let page = state.posts.find_page(filter, &request).await?;
    hydrate(state, page).await
}

/// Comments of a post with their authors, oldest first.
pub async fn comments_for(state: &AppState, post_id: Uuid) -> AppResult<Vec<CommentView>> {
    let comments = state.comments.list_for_post(post_id).await?;
    let authors = users_by_id(state, unique(comments.iter().map(|c| c.author_id))).await?;

    Ok(comments
        .into_iter()
        .filter_map(|comment| {
            let author = authors.get(&comment.author_id)?.clone();
            Some(CommentView { comment, author })
        })
        .collect())
}
