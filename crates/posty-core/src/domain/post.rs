use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters shown when a post is used as a label.
const EXCERPT_LEN: usize = 10;

/// Post entity - a text entry published by an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    /// Media-relative path of the attached image, e.g. `posts/<uuid>.png`.
    pub image: Option<String>,
}

impl Post {
    /// Create a new post published now.
    pub fn new(author_id: Uuid, text: String, group_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            pub_date: Utc::now(),
            author_id,
            group_id,
            image: None,
        }
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    /// First characters of the text, used in page titles.
    pub fn excerpt(&self) -> String {
        self.text.chars().take(EXCERPT_LEN).collect()
    }
}

/// Which posts a listing is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post.
    All,
    /// Posts tagged with a group.
    Group(Uuid),
    /// Posts written by an author.
    Author(Uuid),
    /// Posts written by authors the given user follows.
    FollowedBy(Uuid),
}
