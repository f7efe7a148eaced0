use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Free-text editor notes, one per survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SurveyNote {
    pub survey_id: i64,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaveNoteRequest {
    pub content: String,
}
