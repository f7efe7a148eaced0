use crate::storage::{
    NoteRepository, QuestionRepository, Resource, ResourceFields, ResourceRepository,
    ResponseRepository, SessionRepository, StorageError, SurveyRepository, UploadRepository,
};
use async_trait::async_trait;
use shared_types::{
    now_timestamp, NewQuestion, NewUpload, OrderUpdate, Question, QuestionPatch, ResourceKind,
    Response, Session, Survey, SurveyNote, Upload,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-local storage backing the core's tests and embedders that do not
/// need persistence.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    last_id: i64,
    fail_writes: bool,
    surveys: BTreeMap<i64, Survey>,
    questions: BTreeMap<i64, Question>,
    sessions: BTreeMap<i64, Session>,
    responses: BTreeMap<i64, Response>,
    resources: BTreeMap<i64, StoredResource>,
    notes: HashMap<i64, SurveyNote>,
    uploads: BTreeMap<i64, Upload>,
}

#[derive(Clone)]
struct StoredResource {
    kind: ResourceKind,
    title: Option<String>,
    content: String,
    created_at: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::OperationFailed(
                "storage is unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn clear_references(&mut self, kind: ResourceKind, resource_id: i64) {
        for question in self.questions.values_mut() {
            match kind {
                ResourceKind::Hint if question.hint_id == Some(resource_id) => {
                    question.hint_id = None;
                }
                ResourceKind::Learn if question.learn_id == Some(resource_id) => {
                    question.learn_id = None;
                }
                ResourceKind::Action if question.action_id == Some(resource_id) => {
                    question.action_id = None;
                    question.action_trigger = None;
                }
                ResourceKind::Terminate if question.terminate_id == Some(resource_id) => {
                    question.terminate_id = None;
                    question.terminate_trigger = None;
                }
                _ => {}
            }
        }
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating an unreachable store.
    /// Reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.fail_writes = fail;
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::OperationFailed(format!("Lock error: {}", e)))
    }
}

#[async_trait]
impl SurveyRepository for InMemoryStorage {
    async fn create_survey(
        &self,
        name: &str,
        created_by: Option<&str>,
    ) -> Result<Survey, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let survey = Survey {
            id: tables.next_id(),
            name: name.to_string(),
            created_by: created_by.map(str::to_string),
            created_at: now_timestamp(),
        };
        tables.surveys.insert(survey.id, survey.clone());
        Ok(survey)
    }

    async fn get_survey(&self, survey_id: i64) -> Result<Option<Survey>, StorageError> {
        Ok(self.tables()?.surveys.get(&survey_id).cloned())
    }

    async fn list_surveys(&self) -> Result<Vec<Survey>, StorageError> {
        let tables = self.tables()?;
        let mut surveys: Vec<Survey> = tables.surveys.values().cloned().collect();
        surveys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(surveys)
    }

    async fn rename_survey(&self, survey_id: i64, name: &str) -> Result<Survey, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let survey = tables
            .surveys
            .get_mut(&survey_id)
            .ok_or_else(|| StorageError::NotFound(format!("survey {}", survey_id)))?;
        survey.name = name.to_string();
        Ok(survey.clone())
    }

    async fn delete_survey(&self, survey_id: i64) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        if tables.surveys.remove(&survey_id).is_none() {
            return Err(StorageError::NotFound(format!("survey {}", survey_id)));
        }

        tables.questions.retain(|_, q| q.survey_id != survey_id);
        let session_ids: Vec<i64> = tables
            .sessions
            .values()
            .filter(|s| s.survey_id == survey_id)
            .map(|s| s.id)
            .collect();
        tables.sessions.retain(|_, s| s.survey_id != survey_id);
        tables
            .responses
            .retain(|_, r| !session_ids.contains(&r.session_id));
        tables
            .uploads
            .retain(|_, u| !session_ids.contains(&u.session_id));
        tables.notes.remove(&survey_id);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryStorage {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        if !tables.surveys.contains_key(&question.survey_id) {
            return Err(StorageError::NotFound(format!(
                "survey {}",
                question.survey_id
            )));
        }

        let question = Question {
            id: tables.next_id(),
            survey_id: question.survey_id,
            text: question.text,
            order_position: question.order_position,
            yes_leads_to: None,
            no_leads_to: None,
            hint_id: None,
            learn_id: None,
            action_id: None,
            terminate_id: None,
            action_trigger: None,
            terminate_trigger: None,
            has_upload: false,
            created_at: now_timestamp(),
        };
        tables.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn get_question(&self, question_id: i64) -> Result<Option<Question>, StorageError> {
        Ok(self.tables()?.questions.get(&question_id).cloned())
    }

    async fn list_questions(&self, survey_id: i64) -> Result<Vec<Question>, StorageError> {
        let tables = self.tables()?;
        let mut questions: Vec<Question> = tables
            .questions
            .values()
            .filter(|q| q.survey_id == survey_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.order_position, q.id));
        Ok(questions)
    }

    async fn update_question(
        &self,
        question_id: i64,
        patch: &QuestionPatch,
    ) -> Result<Question, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let question = tables
            .questions
            .get_mut(&question_id)
            .ok_or_else(|| StorageError::NotFound(format!("question {}", question_id)))?;
        question.apply_patch(patch);
        Ok(question.clone())
    }

    async fn delete_question(&self, question_id: i64) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        if tables.questions.remove(&question_id).is_none() {
            return Err(StorageError::NotFound(format!("question {}", question_id)));
        }

        for question in tables.questions.values_mut() {
            if question.yes_leads_to == Some(question_id) {
                question.yes_leads_to = None;
            }
            if question.no_leads_to == Some(question_id) {
                question.no_leads_to = None;
            }
        }
        tables.responses.retain(|_, r| r.question_id != question_id);
        Ok(())
    }

    async fn reorder_questions(&self, updates: &[OrderUpdate]) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        if let Some(missing) = updates
            .iter()
            .find(|u| !tables.questions.contains_key(&u.id))
        {
            return Err(StorageError::NotFound(format!("question {}", missing.id)));
        }

        for update in updates {
            if let Some(question) = tables.questions.get_mut(&update.id) {
                question.order_position = update.order_position;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemoryStorage {
    async fn create_session(
        &self,
        survey_id: i64,
        respondent: Option<&str>,
    ) -> Result<Session, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        if !tables.surveys.contains_key(&survey_id) {
            return Err(StorageError::NotFound(format!("survey {}", survey_id)));
        }

        let session = Session {
            id: tables.next_id(),
            survey_id,
            respondent: respondent.map(str::to_string),
            started_at: now_timestamp(),
            completed_at: None,
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: i64) -> Result<Option<Session>, StorageError> {
        Ok(self.tables()?.sessions.get(&session_id).cloned())
    }

    async fn list_sessions(&self, survey_id: i64) -> Result<Vec<Session>, StorageError> {
        let tables = self.tables()?;
        Ok(tables
            .sessions
            .values()
            .filter(|s| s.survey_id == survey_id)
            .cloned()
            .collect())
    }

    async fn complete_session(&self, session_id: i64) -> Result<Session, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let session = tables
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| StorageError::NotFound(format!("session {}", session_id)))?;
        session.completed_at = Some(now_timestamp());
        Ok(session.clone())
    }
}

#[async_trait]
impl ResponseRepository for InMemoryStorage {
    async fn insert_response(
        &self,
        session_id: i64,
        question_id: i64,
        answer: bool,
    ) -> Result<Response, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        if tables
            .responses
            .values()
            .any(|r| r.session_id == session_id && r.question_id == question_id)
        {
            return Err(StorageError::OperationFailed(format!(
                "session {} already answered question {}",
                session_id, question_id
            )));
        }

        let now = now_timestamp();
        let response = Response {
            id: tables.next_id(),
            session_id,
            question_id,
            answer,
            created_at: now,
            updated_at: now,
        };
        tables.responses.insert(response.id, response.clone());
        Ok(response)
    }

    async fn update_response(
        &self,
        response_id: i64,
        answer: bool,
    ) -> Result<Response, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let response = tables
            .responses
            .get_mut(&response_id)
            .ok_or_else(|| StorageError::NotFound(format!("response {}", response_id)))?;
        response.answer = answer;
        response.updated_at = now_timestamp();
        Ok(response.clone())
    }

    async fn list_responses(&self, session_id: i64) -> Result<Vec<Response>, StorageError> {
        let tables = self.tables()?;
        Ok(tables
            .responses
            .values()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn delete_responses_after(
        &self,
        session_id: i64,
        response_id: i64,
    ) -> Result<usize, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let before = tables.responses.len();
        tables
            .responses
            .retain(|id, r| !(r.session_id == session_id && *id > response_id));
        Ok(before - tables.responses.len())
    }

    async fn delete_responses(&self, session_id: i64) -> Result<usize, StorageError> {
        self.delete_responses_after(session_id, 0).await
    }
}

#[async_trait]
impl<R: Resource> ResourceRepository<R> for InMemoryStorage {
    async fn create_resource(&self, fields: ResourceFields) -> Result<R, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let id = tables.next_id();
        let stored = StoredResource {
            kind: R::KIND,
            title: fields.title,
            content: fields.content,
            created_at: now_timestamp(),
        };
        tables.resources.insert(id, stored.clone());
        Ok(R::from_row(id, stored.title, stored.content, stored.created_at))
    }

    async fn get_resource(&self, resource_id: i64) -> Result<Option<R>, StorageError> {
        let tables = self.tables()?;
        Ok(tables
            .resources
            .get(&resource_id)
            .filter(|r| r.kind == R::KIND)
            .map(|r| R::from_row(resource_id, r.title.clone(), r.content.clone(), r.created_at)))
    }

    async fn list_resources(&self) -> Result<Vec<R>, StorageError> {
        let tables = self.tables()?;
        Ok(tables
            .resources
            .iter()
            .filter(|(_, r)| r.kind == R::KIND)
            .map(|(id, r)| R::from_row(*id, r.title.clone(), r.content.clone(), r.created_at))
            .collect())
    }

    async fn update_resource(
        &self,
        resource_id: i64,
        fields: ResourceFields,
    ) -> Result<R, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let stored = tables
            .resources
            .get_mut(&resource_id)
            .filter(|r| r.kind == R::KIND)
            .ok_or_else(|| StorageError::NotFound(format!("{} {}", R::KIND, resource_id)))?;
        stored.title = fields.title;
        stored.content = fields.content;
        Ok(R::from_row(
            resource_id,
            stored.title.clone(),
            stored.content.clone(),
            stored.created_at,
        ))
    }

    async fn delete_resource(&self, resource_id: i64) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let exists = tables
            .resources
            .get(&resource_id)
            .is_some_and(|r| r.kind == R::KIND);
        if !exists {
            return Err(StorageError::NotFound(format!("{} {}", R::KIND, resource_id)));
        }

        tables.resources.remove(&resource_id);
        tables.clear_references(R::KIND, resource_id);
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for InMemoryStorage {
    async fn get_note(&self, survey_id: i64) -> Result<Option<SurveyNote>, StorageError> {
        Ok(self.tables()?.notes.get(&survey_id).cloned())
    }

    async fn save_note(&self, survey_id: i64, content: &str) -> Result<SurveyNote, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let now = now_timestamp();
        let note = tables.notes.entry(survey_id).or_insert_with(|| SurveyNote {
            survey_id,
            content: String::new(),
            created_at: now,
            updated_at: now,
        });
        note.content = content.to_string();
        note.updated_at = now;
        Ok(note.clone())
    }
}

#[async_trait]
impl UploadRepository for InMemoryStorage {
    async fn record_upload(&self, upload: NewUpload) -> Result<Upload, StorageError> {
        let mut tables = self.tables()?;
        tables.check_writable()?;

        let upload = Upload {
            id: tables.next_id(),
            session_id: upload.session_id,
            terminate_id: upload.terminate_id,
            file_path: upload.file_path,
            file_name: upload.file_name,
            file_type: upload.file_type,
            file_size: upload.file_size,
            created_at: now_timestamp(),
        };
        tables.uploads.insert(upload.id, upload.clone());
        Ok(upload)
    }

    async fn list_uploads(&self, session_id: i64) -> Result<Vec<Upload>, StorageError> {
        let tables = self.tables()?;
        Ok(tables
            .uploads
            .values()
            .filter(|u| u.session_id == session_id)
            .cloned()
            .collect())
    }
}
