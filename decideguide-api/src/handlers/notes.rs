use super::AppState;
use crate::error::ApiError;
use actix_web::{web, HttpResponse, Result};
use shared_types::SaveNoteRequest;

/// The survey's note, or `null` when none was saved yet.
pub async fn get_note(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let note = data.catalog.note(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(note))
}

pub async fn save_note(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<SaveNoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let note = data
        .catalog
        .save_note(path.into_inner(), &request.content)
        .await?;
    Ok(HttpResponse::Ok().json(note))
}
