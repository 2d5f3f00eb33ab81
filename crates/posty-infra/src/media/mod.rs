//! Media storage implementations - local disk and in-memory.

mod local;
mod memory;

pub use local::LocalMediaStorage;
pub use memory::InMemoryMediaStorage;

use posty_core::ports::MediaError;

/// Directory (relative to the media root) that post images are stored in.
pub const POST_IMAGE_DIR: &str = "posts";

/// Build the media path for a new post image.
fn new_image_path(extension: &str) -> Result<String, MediaError> {
    let extension = extension.to_ascii_lowercase();
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MediaError::InvalidPath(format!(
            "unsupported extension '{extension}'"
        )));
    }
    Ok(format!("{POST_IMAGE_DIR}/{}.{extension}", uuid::Uuid::new_v4()))
}

/// Check that `path` is `posts/<name>` with a plain file name.
///
/// Rejects absolute paths, `..`, nested directories and anything that is
/// not ASCII alphanumeric, `-`, `_` or `.`.
pub(crate) fn check_path(path: &str) -> Result<&str, MediaError> {
    let invalid = || MediaError::InvalidPath(path.to_string());

    let name = path
        .strip_prefix(POST_IMAGE_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(invalid)?;

    let plain = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if plain { Ok(name) } else { Err(invalid()) }
}
