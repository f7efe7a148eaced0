use crate::survey::{Question, Survey};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One respondent run of a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub id: i64,
    pub survey_id: i64,
    pub respondent: Option<String>,
    pub started_at: i64,
    pub completed_at: Option<i64>,
}

impl Session {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// One recorded answer to one node within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Response {
    pub id: i64,
    pub session_id: i64,
    pub question_id: i64,
    pub answer: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Reached a node with no successor for the given answer.
    Normal,
    /// A terminate attachment fired.
    EarlyExit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WalkerState {
    NotStarted,
    InProgress,
    Terminated { reason: TerminationReason },
}

impl WalkerState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, WalkerState::Terminated { .. })
    }
}

/// Deduplicated recommended actions plus the message of the terminate that
/// ended the session, if one did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActionPlan {
    pub actions: Vec<String>,
    pub terminate_message: Option<String>,
}

/// Everything a respondent view needs to render the current step.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub survey: Option<Survey>,
    pub state: WalkerState,
    pub current_question: Option<Question>,
    pub progress: u8,
    pub total_questions: usize,
    pub responses: Vec<Response>,
    pub action_plan: ActionPlan,
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub respondent: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnswerRequest {
    pub question_id: i64,
    pub answer: bool,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NavigateRequest {
    pub question_id: i64,
}
