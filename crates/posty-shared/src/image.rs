//! Post image upload validation.

use thiserror::Error;

/// Extensions accepted for a post image, in the order they are listed to
/// the user.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 9] = [
    "bmp", "gif", "ico", "jpeg", "jpg", "png", "tif", "tiff", "webp",
];

/// A file part taken from a multipart body.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Lower-cased extension of the submitted filename, empty if it has none.
    pub fn extension(&self) -> String {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error(
        "File extension “{0}” is not allowed. Allowed extensions are: {allowed}.",
        allowed = ALLOWED_IMAGE_EXTENSIONS.join(", ")
    )]
    Extension(String),

    #[error("The submitted file is empty.")]
    Empty,

    #[error("The uploaded file is too large.")]
    TooLarge,

    #[error(
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
    )]
    Invalid,
}

/// Check an upload and return the extension to store it under.
///
/// Checks run cheapest first: emptiness, size, extension, then a full
/// decode, so a renamed text file is reported by its extension and a
/// corrupt `.png` by its content.
pub fn validate_image(upload: &ImageUpload, max_bytes: usize) -> Result<String, ImageError> {
    if upload.bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if upload.bytes.len() > max_bytes {
        return Err(ImageError::TooLarge);
    }

    let extension = upload.extension();
    if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImageError::Extension(extension));
    }

    image::load_from_memory(&upload.bytes).map_err(|_| ImageError::Invalid)?;

    Ok(extension)
}

/// Content type to serve a stored image with, by extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
