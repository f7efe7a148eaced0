use crate::storage::StorageError;
use shared_types::ResourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Survey {0} not found")]
    SurveyNotFound(i64),

    #[error("Session {0} not found")]
    SessionNotFound(i64),

    #[error("Question {0} not found")]
    QuestionNotFound(i64),

    #[error("{kind} {id} not found")]
    ResourceNotFound { kind: ResourceKind, id: i64 },

    #[error("No questions found for survey {0}")]
    EmptySurvey(i64),

    #[error("No active session")]
    NoActiveSession,

    #[error("Session {0} is already completed")]
    SessionCompleted(i64),

    #[error("Question {0} is neither the current question nor on the answered path")]
    NotOnPath(i64),

    #[error("Invalid question update: {0}")]
    InvalidPatch(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload of {size} bytes exceeds the limit of {limit} bytes")]
    UploadTooLarge { size: usize, limit: usize },
}

impl SurveyError {
    /// Whether the error names something that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SurveyError::SurveyNotFound(_)
                | SurveyError::SessionNotFound(_)
                | SurveyError::QuestionNotFound(_)
                | SurveyError::ResourceNotFound { .. }
                | SurveyError::Storage(StorageError::NotFound(_))
        )
    }

    /// Whether the caller sent something the service refuses.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            SurveyError::EmptySurvey(_)
                | SurveyError::NoActiveSession
                | SurveyError::SessionCompleted(_)
                | SurveyError::NotOnPath(_)
                | SurveyError::InvalidPatch(_)
                | SurveyError::InvalidOrder(_)
                | SurveyError::InvalidInput(_)
                | SurveyError::UploadTooLarge { .. }
        )
    }
}

pub type SurveyResult<T> = Result<T, SurveyError>;
