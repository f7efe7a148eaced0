use super::AppState;
use crate::error::{ApiError, ApiResult};
use actix_web::{web, HttpResponse, Result};
use decideguide_core::SurveyResult;
use serde::Serialize;
use shared_types::{Action, CreateResourceRequest, Hint, Learn, ResourceKind, Terminate};

fn parse_kind(kind: &str) -> ApiResult<ResourceKind> {
    kind.parse::<ResourceKind>().map_err(ApiError::NotFound)
}

/// Run `$body` with `$ty` bound to the row type of `$kind`.
macro_rules! with_resource_type {
    ($kind:expr, $ty:ident => $body:expr) => {
        match $kind {
            ResourceKind::Hint => {
                type $ty = Hint;
                $body
            }
            ResourceKind::Learn => {
                type $ty = Learn;
                $body
            }
            ResourceKind::Action => {
                type $ty = Action;
                $body
            }
            ResourceKind::Terminate => {
                type $ty = Terminate;
                $body
            }
        }
    };
}

fn json_of<R: Serialize>(result: SurveyResult<R>) -> ApiResult<serde_json::Value> {
    let value = result?;
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn list_resources(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let resources = data.catalog.fetch_resources().await?;
    Ok(HttpResponse::Ok().json(resources))
}

pub async fn create_resource(
    data: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<CreateResourceRequest>,
) -> Result<HttpResponse, ApiError> {
    let kind = parse_kind(&path)?;
    let body = with_resource_type!(kind, R => {
        json_of(data.catalog.create_resource::<R>(&request).await)
    })?;
    Ok(HttpResponse::Created().json(body))
}

pub async fn get_resource(
    data: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let kind = parse_kind(&kind)?;
    let body = with_resource_type!(kind, R => {
        json_of(data.catalog.get_resource::<R>(id).await)
    })?;
    Ok(HttpResponse::Ok().json(body))
}

/// Rewrites the resource in place; every question referencing it sees the
/// new content.
pub async fn update_resource(
    data: web::Data<AppState>,
    path: web::Path<(String, i64)>,
    request: web::Json<CreateResourceRequest>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let kind = parse_kind(&kind)?;
    let body = with_resource_type!(kind, R => {
        json_of(data.catalog.update_resource::<R>(id, &request).await)
    })?;
    data.sessions.forget_all()?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn delete_resource(
    data: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let kind = parse_kind(&kind)?;
    with_resource_type!(kind, R => data.catalog.delete_resource::<R>(id).await)?;
    data.sessions.forget_all()?;
    Ok(HttpResponse::NoContent().finish())
}
