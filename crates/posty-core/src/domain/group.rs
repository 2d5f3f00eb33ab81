use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Maximum group title length.
pub const GROUP_TITLE_MAX_LEN: usize = 200;

/// Group entity - a named category posts can belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    /// Create a new group, validating title and slug.
    pub fn new(title: String, slug: String, description: String) -> Result<Self, DomainError> {
        if title.trim().is_empty() || title.chars().count() > GROUP_TITLE_MAX_LEN {
            return Err(DomainError::Validation(format!(
                "Group title must be between 1 and {GROUP_TITLE_MAX_LEN} characters."
            )));
        }
        validate_slug(&slug)?;

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            slug,
            description,
        })
    }
}

/// A slug is a non-empty run of ASCII letters, digits, hyphens or underscores.
pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "Invalid slug '{slug}': use letters, numbers, underscores or hyphens."
        )))
    }
}
