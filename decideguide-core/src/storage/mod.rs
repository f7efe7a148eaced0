//! Typed repositories, one per table.
//!
//! The walker, editor and catalog only talk to storage through these traits,
//! so they run unchanged against SQLite in the service and against
//! [`InMemoryStorage`] in tests.

use async_trait::async_trait;
use shared_types::{
    Action, Hint, Learn, NewQuestion, NewUpload, OrderUpdate, Question, QuestionPatch,
    ResourceKind, Response, Session, Survey, SurveyNote, Terminate, Upload,
};

mod memory;
mod objects;

pub use memory::InMemoryStorage;
pub use objects::{InMemoryObjectStore, ObjectStore};

#[async_trait]
pub trait SurveyRepository: Send + Sync {
    async fn create_survey(
        &self,
        name: &str,
        created_by: Option<&str>,
    ) -> Result<Survey, StorageError>;
    async fn get_survey(&self, survey_id: i64) -> Result<Option<Survey>, StorageError>;
    /// Newest first.
    async fn list_surveys(&self) -> Result<Vec<Survey>, StorageError>;
    async fn rename_survey(&self, survey_id: i64, name: &str) -> Result<Survey, StorageError>;
    /// Removes the survey with its questions, sessions, responses and notes.
    async fn delete_survey(&self, survey_id: i64) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, StorageError>;
    async fn get_question(&self, question_id: i64) -> Result<Option<Question>, StorageError>;
    /// Ordered by `order_position`.
    async fn list_questions(&self, survey_id: i64) -> Result<Vec<Question>, StorageError>;
    async fn update_question(
        &self,
        question_id: i64,
        patch: &QuestionPatch,
    ) -> Result<Question, StorageError>;
    /// Deletes the node and clears every `yes_leads_to`/`no_leads_to` that
    /// pointed at it, atomically.
    async fn delete_question(&self, question_id: i64) -> Result<(), StorageError>;
    /// Applies the whole batch or nothing.
    async fn reorder_questions(&self, updates: &[OrderUpdate]) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(
        &self,
        survey_id: i64,
        respondent: Option<&str>,
    ) -> Result<Session, StorageError>;
    async fn get_session(&self, session_id: i64) -> Result<Option<Session>, StorageError>;
    async fn list_sessions(&self, survey_id: i64) -> Result<Vec<Session>, StorageError>;
    async fn complete_session(&self, session_id: i64) -> Result<Session, StorageError>;
}

#[async_trait]
pub trait ResponseRepository: Send + Sync {
    async fn insert_response(
        &self,
        session_id: i64,
        question_id: i64,
        answer: bool,
    ) -> Result<Response, StorageError>;
    async fn update_response(&self, response_id: i64, answer: bool)
        -> Result<Response, StorageError>;
    /// Ordered by creation.
    async fn list_responses(&self, session_id: i64) -> Result<Vec<Response>, StorageError>;
    /// Deletes the session's responses created after `response_id`; `0`
    /// deletes them all.
    async fn delete_responses_after(
        &self,
        session_id: i64,
        response_id: i64,
    ) -> Result<usize, StorageError>;
    async fn delete_responses(&self, session_id: i64) -> Result<usize, StorageError>;
}

/// Title and content of a resource row; `title` is `None` for actions and
/// terminates.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceFields {
    pub title: Option<String>,
    pub content: String,
}

/// A row type of one of the resource tables.
pub trait Resource: Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn from_row(id: i64, title: Option<String>, content: String, created_at: i64) -> Self;
    fn id(&self) -> i64;
    fn title(&self) -> Option<&str>;
    fn content(&self) -> &str;
}

impl Resource for Hint {
    const KIND: ResourceKind = ResourceKind::Hint;

    fn from_row(id: i64, title: Option<String>, content: String, created_at: i64) -> Self {
        Hint {
            id,
            title: title.unwrap_or_default(),
            content,
            created_at,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> Option<&str> {
        Some(&self.title)
    }

    fn content(&self) -> &str {
        &self.content
    }
}

impl Resource for Learn {
    const KIND: ResourceKind = ResourceKind::Learn;

    fn from_row(id: i64, title: Option<String>, content: String, created_at: i64) -> Self {
        Learn {
            id,
            title: title.unwrap_or_default(),
            content,
            created_at,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> Option<&str> {
        Some(&self.title)
    }

    fn content(&self) -> &str {
        &self.content
    }
}

impl Resource for Action {
    const KIND: ResourceKind = ResourceKind::Action;

    fn from_row(id: i64, _title: Option<String>, content: String, created_at: i64) -> Self {
        Action {
            id,
            content,
            created_at,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> Option<&str> {
        None
    }

    fn content(&self) -> &str {
        &self.content
    }
}

impl Resource for Terminate {
    const KIND: ResourceKind = ResourceKind::Terminate;

    fn from_row(id: i64, _title: Option<String>, content: String, created_at: i64) -> Self {
        Terminate {
            id,
            content,
            created_at,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> Option<&str> {
        None
    }

    fn content(&self) -> &str {
        &self.content
    }
}

#[async_trait]
pub trait ResourceRepository<R: Resource>: Send + Sync {
    async fn create_resource(&self, fields: ResourceFields) -> Result<R, StorageError>;
    async fn get_resource(&self, resource_id: i64) -> Result<Option<R>, StorageError>;
    async fn list_resources(&self) -> Result<Vec<R>, StorageError>;
    /// Rewrites the row in place and returns it.
    async fn update_resource(
        &self,
        resource_id: i64,
        fields: ResourceFields,
    ) -> Result<R, StorageError>;
    /// Questions referencing the resource lose the reference and, for
    /// actions and terminates, its trigger.
    async fn delete_resource(&self, resource_id: i64) -> Result<(), StorageError>;
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn get_note(&self, survey_id: i64) -> Result<Option<SurveyNote>, StorageError>;
    /// Insert or replace the survey's note.
    async fn save_note(&self, survey_id: i64, content: &str) -> Result<SurveyNote, StorageError>;
}

#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn record_upload(&self, upload: NewUpload) -> Result<Upload, StorageError>;
    async fn list_uploads(&self, session_id: i64) -> Result<Vec<Upload>, StorageError>;
}

/// Everything the service persists.
pub trait SurveyStorage:
    SurveyRepository
    + QuestionRepository
    + SessionRepository
    + ResponseRepository
    + ResourceRepository<Hint>
    + ResourceRepository<Learn>
    + ResourceRepository<Action>
    + ResourceRepository<Terminate>
    + NoteRepository
    + UploadRepository
{
}

impl<T> SurveyStorage for T where
    T: SurveyRepository
        + QuestionRepository
        + SessionRepository
        + ResponseRepository
        + ResourceRepository<Hint>
        + ResourceRepository<Learn>
        + ResourceRepository<Action>
        + ResourceRepository<Terminate>
        + NoteRepository
        + UploadRepository
{
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage operation failed: {0}")]
    OperationFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for StorageError {
    fn from(err: anyhow::Error) -> Self {
        StorageError::Other(err.to_string())
    }
}
