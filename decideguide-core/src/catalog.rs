//! Surveys, the resource library and survey notes.

use crate::error::{SurveyError, SurveyResult};
use crate::storage::{
    NoteRepository, QuestionRepository, Resource, ResourceFields, ResourceRepository,
    SessionRepository, SurveyRepository, SurveyStorage,
};
use regex::Regex;
use shared_types::{
    Action, CreateResourceRequest, Hint, Learn, ResourcesResponse, Session, Survey,
    SurveyDetailsResponse, SurveyNote, Terminate,
};
use std::sync::{Arc, OnceLock};
use tracing::info;

#[derive(Clone)]
pub struct SurveyCatalog {
    storage: Arc<dyn SurveyStorage>,
}

impl SurveyCatalog {
    pub fn new(storage: Arc<dyn SurveyStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> Arc<dyn SurveyStorage> {
        Arc::clone(&self.storage)
    }

    pub async fn list_surveys(&self) -> SurveyResult<Vec<Survey>> {
        Ok(self.storage.list_surveys().await?)
    }

    pub async fn create_survey(
        &self,
        name: &str,
        created_by: Option<&str>,
    ) -> SurveyResult<Survey> {
        let name = required_name(name)?;
        let survey = self.storage.create_survey(name, created_by).await?;
        info!(survey_id = survey.id, name = %survey.name, "Created survey");
        Ok(survey)
    }

    pub async fn get_survey(&self, survey_id: i64) -> SurveyResult<Survey> {
        self.storage
            .get_survey(survey_id)
            .await?
            .ok_or(SurveyError::SurveyNotFound(survey_id))
    }

    pub async fn rename_survey(&self, survey_id: i64, name: &str) -> SurveyResult<Survey> {
        let name = required_name(name)?;
        self.get_survey(survey_id).await?;
        Ok(self.storage.rename_survey(survey_id, name).await?)
    }

    /// Removes the survey along with everything recorded against it.
    pub async fn delete_survey(&self, survey_id: i64) -> SurveyResult<()> {
        self.get_survey(survey_id).await?;
        self.storage.delete_survey(survey_id).await?;
        info!(survey_id, "Deleted survey");
        Ok(())
    }

    pub async fn survey_details(&self, survey_id: i64) -> SurveyResult<SurveyDetailsResponse> {
        let survey = self.get_survey(survey_id).await?;
        let questions = self.storage.list_questions(survey_id).await?;
        Ok(SurveyDetailsResponse { survey, questions })
    }

    pub async fn list_sessions(&self, survey_id: i64) -> SurveyResult<Vec<Session>> {
        self.get_survey(survey_id).await?;
        Ok(self.storage.list_sessions(survey_id).await?)
    }

    pub async fn fetch_resources(&self) -> SurveyResult<ResourcesResponse> {
        let storage = self.storage.as_ref();
        Ok(ResourcesResponse {
            hints: ResourceRepository::<Hint>::list_resources(storage).await?,
            learns: ResourceRepository::<Learn>::list_resources(storage).await?,
            actions: ResourceRepository::<Action>::list_resources(storage).await?,
            terminates: ResourceRepository::<Terminate>::list_resources(storage).await?,
        })
    }

    pub async fn create_resource<R>(&self, request: &CreateResourceRequest) -> SurveyResult<R>
    where
        R: Resource,
        dyn SurveyStorage: ResourceRepository<R>,
    {
        let fields = resource_fields::<R>(request)?;
        let resource =
            ResourceRepository::<R>::create_resource(self.storage.as_ref(), fields).await?;
        info!(kind = %R::KIND, resource_id = resource.id(), "Created resource");
        Ok(resource)
    }

    pub async fn get_resource<R>(&self, resource_id: i64) -> SurveyResult<R>
    where
        R: Resource,
        dyn SurveyStorage: ResourceRepository<R>,
    {
        ResourceRepository::<R>::get_resource(self.storage.as_ref(), resource_id)
            .await?
            .ok_or(SurveyError::ResourceNotFound {
                kind: R::KIND,
                id: resource_id,
            })
    }

    /// Rewrites the resource in place, so every question referencing it
    /// sees the new text.
    pub async fn update_resource<R>(
        &self,
        resource_id: i64,
        request: &CreateResourceRequest,
    ) -> SurveyResult<R>
    where
        R: Resource,
        dyn SurveyStorage: ResourceRepository<R>,
    {
        let fields = resource_fields::<R>(request)?;
        self.get_resource::<R>(resource_id).await?;
        Ok(
            ResourceRepository::<R>::update_resource(self.storage.as_ref(), resource_id, fields)
                .await?,
        )
    }

    pub async fn delete_resource<R>(&self, resource_id: i64) -> SurveyResult<()>
    where
        R: Resource,
        dyn SurveyStorage: ResourceRepository<R>,
    {
        self.get_resource::<R>(resource_id).await?;
        ResourceRepository::<R>::delete_resource(self.storage.as_ref(), resource_id).await?;
        info!(kind = %R::KIND, resource_id, "Deleted resource");
        Ok(())
    }

    pub async fn note(&self, survey_id: i64) -> SurveyResult<Option<SurveyNote>> {
        self.get_survey(survey_id).await?;
        Ok(self.storage.get_note(survey_id).await?)
    }

    pub async fn save_note(&self, survey_id: i64, content: &str) -> SurveyResult<SurveyNote> {
        self.get_survey(survey_id).await?;
        Ok(self.storage.save_note(survey_id, content).await?)
    }
}

fn required_name(name: &str) -> SurveyResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SurveyError::InvalidInput(
            "survey name must not be empty".to_string(),
        ));
    }
    Ok(name)
}

/// Text left once every HTML tag is removed.
pub fn strip_html(content: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    tags.replace_all(content, "").into_owned()
}

fn resource_fields<R: Resource>(request: &CreateResourceRequest) -> SurveyResult<ResourceFields> {
    let kind = R::KIND;
    if kind.has_title() {
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SurveyError::InvalidInput(format!("{} need a title", kind)))?;
        return Ok(ResourceFields {
            title: Some(title.to_string()),
            content: request.content.clone(),
        });
    }

    if strip_html(&request.content).trim().is_empty() {
        return Err(SurveyError::InvalidInput(format!(
            "{} content must not be empty",
            kind
        )));
    }
    Ok(ResourceFields {
        title: None,
        content: request.content.clone(),
    })
}
