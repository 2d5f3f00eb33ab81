//! Author profile page.

use posty_core::domain::{Page, User};

use super::{escape, layout, post_list};
use crate::listing::PostCard;

/// Counters and relation shown above an author's posts.
pub struct ProfileView<'a> {
    pub author: &'a User,
    pub post_count: u64,
    pub follower_count: u64,
    pub following_count: u64,
    /// `Some(is_following)` when a logged-in viewer looks at someone else.
    pub following: Option<bool>,
    pub posts: &'a Page<PostCard>,
}

pub fn profile(viewer: Option<&User>, view: &ProfileView<'_>) -> String {
    let name = escape(&view.author.username);

    let button = match view.following {
        Some(true) => format!(
            r#"<a class="button" href="/{name}/unfollow/">Unfollow</a>"#
        ),
        Some(false) => format!(r#"<a class="button" href="/{name}/follow/">Follow</a>"#),
        None => String::new(),
    };

    let content = format!(
        r#"<section class="profile">
  <h1>{name}</h1>
  <ul class="counters">
    <li>Posts: {posts}</li>
    <li>Followers: {followers}</li>
    <li>Following: {following}</li>
  </ul>
  {button}
</section>
{list}"#,
        posts = view.post_count,
        followers = view.follower_count,
        following = view.following_count,
        list = post_list(view.posts),
    );

    layout(&view.author.username, viewer, &content)
}
