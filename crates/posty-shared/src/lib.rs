//! # Posty Shared
//!
//! Form payloads submitted by the browser, their validation rules and the
//! error collection used to redisplay a form with inline messages.

pub mod dto;
pub mod form;
pub mod image;

pub use form::FormErrors;
pub use image::{ImageError, ImageUpload, validate_image};
