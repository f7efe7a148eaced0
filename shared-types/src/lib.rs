use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod notes;
pub mod resources;
pub mod session;
pub mod survey;
pub mod typescript_gen;
pub mod uploads;

pub use typescript_gen::generate_typescript_definitions;

pub use notes::{SaveNoteRequest, SurveyNote};
pub use resources::{
    Action, CreateResourceRequest, Hint, Learn, ResourceKind, ResourcesResponse, Terminate,
};
pub use session::{
    ActionPlan, AnswerRequest, NavigateRequest, Response, Session, SessionSnapshot,
    StartSessionRequest, TerminationReason, WalkerState,
};
pub use survey::{
    CreateQuestionRequest, CreateSurveyRequest, NewQuestion, OrderUpdate, Question,
    QuestionPatch, RenameSurveyRequest, ReorderRequest, Survey, SurveyDetailsResponse,
    SurveyListResponse, Trigger,
};
pub use uploads::{NewUpload, Upload, UploadListResponse, UploadQuery};

/// Current Unix timestamp in seconds, the unit every record in the service uses.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VersionResponse {
    pub version: String,
    pub service: String,
}
