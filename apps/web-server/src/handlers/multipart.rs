//! Reading the multipart post form.

use actix_multipart::{Field, Multipart};
use actix_web::http::header::{self, ContentDisposition};
use futures::TryStreamExt;

use posty_shared::dto::PostForm;
use posty_shared::{FormErrors, ImageUpload};

use crate::middleware::error::{AppError, AppResult};

/// Upper bound for a text part.
const MAX_TEXT_BYTES: usize = 64 * 1024;

/// A post form as it came off the wire.
#[derive(Debug, Default)]
pub struct PostParts {
    pub form: PostForm,
    pub upload: Option<ImageUpload>,
    /// Text fields that went past 64 KiB. Their value in `form` is cut at
    /// the limit.
    pub errors: FormErrors,
}

/// Split a `multipart/form-data` post form into its text fields and the
/// optional image part.
///
/// Image bytes are buffered up to one byte past `max_image_bytes`, enough for
/// validation to report the file as too large without holding all of it. An
/// empty file input (no filename, no content) counts as no upload.
pub async fn read_post_form(mut payload: Multipart, max_image_bytes: usize) -> AppResult<PostParts> {
    let mut parts = PostParts::default();

    while let Some(field) = payload.try_next().await? {
        let Some(disposition) = field
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok())
        else {
            drain(field).await?;
            continue;
        };
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);

        match name.as_str() {
            "image" => {
                let (bytes, _) = read_limited(field, max_image_bytes + 1).await?;
                let filename = filename.unwrap_or_default();
                if !filename.is_empty() || !bytes.is_empty() {
                    parts.upload = Some(ImageUpload::new(filename, bytes));
                }
            }
            "text" => parts.form.text = read_text(field, "text", &mut parts.errors).await?,
            "group" => parts.form.group = read_text(field, "group", &mut parts.errors).await?,
            "image-clear" => {
                drain(field).await?;
                parts.form.image_clear = true;
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown form field");
                drain(field).await?;
            }
        }
    }

    Ok(parts)
}

/// Buffer at most `limit` bytes of a part and drain the rest. The flag is
/// set when something was left out.
async fn read_limited(mut field: Field, limit: usize) -> AppResult<(Vec<u8>, bool)> {
    let mut bytes = Vec::new();
    let mut overflow = false;
    while let Some(chunk) = field.try_next().await? {
        let room = limit.saturating_sub(bytes.len());
        if chunk.len() > room {
            overflow = true;
        }
        bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    Ok((bytes, overflow))
}

async fn read_text(field: Field, name: &str, errors: &mut FormErrors) -> AppResult<String> {
    let (mut bytes, overflow) = read_limited(field, MAX_TEXT_BYTES).await?;
    if overflow {
        errors.add(name, too_long_message());
        // The cut may split a character
        if let Err(e) = std::str::from_utf8(&bytes) {
            bytes.truncate(e.valid_up_to());
        }
    }
    String::from_utf8(bytes).map_err(|_| AppError::BadRequest("Form field is not UTF-8".into()))
}

fn too_long_message() -> String {
    format!("Ensure this value has at most {} bytes.", MAX_TEXT_BYTES)
}

async fn drain(mut field: Field) -> AppResult<()> {
    while field.try_next().await?.is_some() {}
    Ok(())
}
