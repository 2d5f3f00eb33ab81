//! Domain entities - the core business objects.

mod comment;
mod follow;
mod group;
pub mod pagination;
mod post;
mod user;

pub use comment::Comment;
pub use follow::Follow;
pub use group::{GROUP_TITLE_MAX_LEN, Group, validate_slug};
pub use pagination::{Page, PageRequest};
pub use post::{Post, PostFilter};
pub use user::User;
