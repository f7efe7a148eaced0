use super::AppState;
use crate::error::{ApiError, ApiResult};
use actix_web::{web, HttpResponse, Result};
use decideguide_core::storage::QuestionRepository;
use decideguide_core::{SurveyError, TreeEditor};
use shared_types::{CreateQuestionRequest, QuestionPatch, ReorderRequest};

/// Editor over the survey owning `question_id`.
async fn editor_for_question(data: &AppState, question_id: i64) -> ApiResult<TreeEditor> {
    let storage = data.storage();
    let question = storage
        .get_question(question_id)
        .await
        .map_err(SurveyError::from)?
        .ok_or(SurveyError::QuestionNotFound(question_id))?;
    Ok(TreeEditor::load(storage, question.survey_id).await?)
}

pub async fn create_question(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<CreateQuestionRequest>,
) -> Result<HttpResponse, ApiError> {
    let survey_id = path.into_inner();
    let mut editor = TreeEditor::load(data.storage(), survey_id).await?;
    let question = editor
        .create_question(&request.text, request.order_position)
        .await?;
    data.sessions.forget_survey(survey_id)?;
    Ok(HttpResponse::Created().json(question))
}

pub async fn update_question(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<QuestionPatch>,
) -> Result<HttpResponse, ApiError> {
    let question_id = path.into_inner();
    let mut editor = editor_for_question(&data, question_id).await?;
    let question = editor.update_question(question_id, &request).await?;
    data.sessions.forget_survey(question.survey_id)?;
    Ok(HttpResponse::Ok().json(question))
}

pub async fn delete_question(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let question_id = path.into_inner();
    let mut editor = editor_for_question(&data, question_id).await?;
    editor.delete_question(question_id).await?;
    data.sessions.forget_survey(editor.survey().id)?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn reorder_questions(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<ReorderRequest>,
) -> Result<HttpResponse, ApiError> {
    let survey_id = path.into_inner();
    let mut editor = TreeEditor::load(data.storage(), survey_id).await?;
    editor.reorder(&request.positions).await?;
    data.sessions.forget_survey(survey_id)?;
    Ok(HttpResponse::Ok().json(editor.questions()))
}
