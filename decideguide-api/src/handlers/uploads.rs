use super::AppState;
use crate::error::ApiError;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use shared_types::{UploadListResponse, UploadQuery};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Store the raw request body as a file attached to the session.
pub async fn upload_file(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<UploadQuery>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let upload = data
        .uploads
        .store(
            path.into_inner(),
            query.terminate_id,
            &query.file_name,
            content_type,
            body.to_vec(),
        )
        .await?;
    Ok(HttpResponse::Created().json(upload))
}

pub async fn list_uploads(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let uploads = data.uploads.list(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UploadListResponse { uploads }))
}
