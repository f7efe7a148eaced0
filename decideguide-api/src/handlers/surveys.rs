use super::AppState;
use crate::error::ApiError;
use actix_web::{web, HttpResponse, Result};
use shared_types::{CreateSurveyRequest, RenameSurveyRequest, SurveyListResponse};
use tracing::info;

pub async fn list_surveys(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let surveys = data.catalog.list_surveys().await?;
    Ok(HttpResponse::Ok().json(SurveyListResponse { surveys }))
}

pub async fn create_survey(
    data: web::Data<AppState>,
    request: web::Json<CreateSurveyRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    let survey = data
        .catalog
        .create_survey(&req.name, req.created_by.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(survey))
}

pub async fn get_survey(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let details = data.catalog.survey_details(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(details))
}

pub async fn rename_survey(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<RenameSurveyRequest>,
) -> Result<HttpResponse, ApiError> {
    let survey = data
        .catalog
        .rename_survey(path.into_inner(), &request.name)
        .await?;
    Ok(HttpResponse::Ok().json(survey))
}

pub async fn delete_survey(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let survey_id = path.into_inner();
    data.catalog.delete_survey(survey_id).await?;
    data.sessions.forget_survey(survey_id)?;
    info!(survey_id, "Survey removed via API");
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_sessions(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let sessions = data.catalog.list_sessions(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(sessions))
}
