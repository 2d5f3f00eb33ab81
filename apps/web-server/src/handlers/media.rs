//! Uploaded image serving.

use actix_web::{HttpResponse, web};

use posty_shared::image::content_type_for;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /media/{path}
pub async fn serve(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let path = path.into_inner();
    let bytes = state.media.open(&path).await?.ok_or(AppError::NotFound)?;

    let extension = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(extension))
        .body(bytes))
}
