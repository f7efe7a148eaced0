use super::AppState;
use crate::error::ApiError;
use actix_web::{web, HttpResponse, Result};
use decideguide_core::SessionWalker;
use shared_types::{AnswerRequest, NavigateRequest, StartSessionRequest};
use tracing::info;

pub async fn start_session(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: Option<web::Json<StartSessionRequest>>,
) -> Result<HttpResponse, ApiError> {
    let survey_id = path.into_inner();
    let respondent = request.and_then(|r| r.into_inner().respondent);

    let snapshot = data
        .sessions
        .start(survey_id, respondent.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(snapshot))
}

pub async fn get_session(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let walker = data.sessions.walker(path.into_inner()).await?;
    let snapshot = walker.lock().await.snapshot();
    Ok(HttpResponse::Ok().json(snapshot))
}

pub async fn answer_question(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<AnswerRequest>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let snapshot = data
        .sessions
        .answer(session_id, request.question_id, request.answer)
        .await?;
    info!(
        session_id,
        question_id = request.question_id,
        answer = request.answer,
        progress = snapshot.progress,
        "Recorded answer"
    );
    Ok(HttpResponse::Ok().json(snapshot))
}

pub async fn navigate(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<NavigateRequest>,
) -> Result<HttpResponse, ApiError> {
    let walker = data.sessions.walker(path.into_inner()).await?;
    let mut walker = walker.lock().await;

    walker.navigate_to_question(request.question_id)?;
    Ok(HttpResponse::Ok().json(walker.snapshot()))
}

/// Responds with the snapshot of the fresh session that replaces this one.
pub async fn reset_session(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let snapshot = data.sessions.reset(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// Plan rebuilt from the stored responses, independent of any cached walker.
pub async fn get_plan(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let walker = SessionWalker::resume(data.storage(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(walker.current_plan()))
}
