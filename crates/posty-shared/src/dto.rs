//! Form payloads submitted by the browser.
//!
//! Each form is deserialized as-is, then `clean`ed: text is trimmed and the
//! `validator` rules run on the trimmed values. Checks that need the
//! database (unknown group, taken username, wrong password) are added by the
//! handler on top of the returned [`FormErrors`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use crate::form::{FormErrors, INVALID_CHOICE};
#[cfg(test)]
use crate::form::REQUIRED;

/// Top-level path segments a username may not take.
pub const RESERVED_USERNAMES: [&str; 6] = ["new", "follow", "group", "auth", "media", "api"];

const USERNAME_MAX: u64 = 150;
const PASSWORD_MIN: u64 = 8;

/// `POST /auth/login/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

impl LoginForm {
    pub fn clean(mut self) -> Result<Self, FormErrors> {
        self.username = self.username.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

/// `POST /auth/signup/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SignupForm {
    #[validate(length(
        min = 1,
        max = 150,
        message = "Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only."
    ))]
    pub username: String,
    pub email: String,
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password1: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password2: String,
}

impl SignupForm {
    pub fn clean(mut self) -> Result<Self, FormErrors> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();

        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => e.into(),
        };

        if !self.username.is_empty()
            && self.username.chars().count() as u64 <= USERNAME_MAX
            && !self
                .username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if RESERVED_USERNAMES.contains(&self.username.to_lowercase().as_str()) {
            errors.add("username", "A user with that username already exists.");
        }
        if !self.email.is_empty() && !self.email.validate_email() {
            errors.add("email", "Enter a valid email address.");
        }
        if self.password1.chars().count() as u64 >= PASSWORD_MIN
            && !self.password2.is_empty()
            && self.password1 != self.password2
        {
            errors.add("password2", "The two password fields didn’t match.");
        }

        errors.into_result().map(|()| self)
    }
}

/// `POST /{username}/{post_id}/comment/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn clean(mut self) -> Result<Self, FormErrors> {
        self.text = self.text.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

/// Text fields of the post form. The image travels next to it as an
/// [`ImageUpload`](crate::image::ImageUpload) because it arrives as a
/// separate multipart part.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// Selected group id; empty means "no group".
    pub group: String,
    /// Set when the "clear" checkbox next to the current image is ticked.
    pub image_clear: bool,
}

impl PostForm {
    /// Trim and validate the text fields.
    ///
    /// On success, returns the form with the parsed group id. A group value
    /// that is not a UUID fails with the same message as an unknown group.
    pub fn clean(mut self) -> Result<(Self, Option<Uuid>), FormErrors> {
        self.text = self.text.trim().to_string();
        self.group = self.group.trim().to_string();

        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => e.into(),
        };

        let group_id = if self.group.is_empty() {
            None
        } else {
            match Uuid::parse_str(&self.group) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            }
        };

        errors.into_result().map(|()| (self, group_id))
    }
}
