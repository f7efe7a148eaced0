use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// A named decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Survey {
    pub id: i64,
    pub name: String,
    pub created_by: Option<String>,
    pub created_at: i64,
}

/// Condition gating an attached action or terminate.
///
/// An absent trigger (`None` wherever one is stored) means the attachment is
/// unconditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Yes,
    No,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Yes => "yes",
            Trigger::No => "no",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Trigger::Yes),
            "no" => Some(Trigger::No),
            _ => None,
        }
    }

    /// Whether a recorded answer satisfies this trigger.
    pub fn matches(&self, answer: bool) -> bool {
        match self {
            Trigger::Yes => answer,
            Trigger::No => !answer,
        }
    }
}

/// One yes/no node of a decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Question {
    pub id: i64,
    pub survey_id: i64,
    /// Rich text (HTML), stored verbatim.
    pub text: String,
    pub order_position: i64,
    pub yes_leads_to: Option<i64>,
    pub no_leads_to: Option<i64>,
    pub hint_id: Option<i64>,
    pub learn_id: Option<i64>,
    pub action_id: Option<i64>,
    pub terminate_id: Option<i64>,
    pub action_trigger: Option<Trigger>,
    pub terminate_trigger: Option<Trigger>,
    pub has_upload: bool,
    pub created_at: i64,
}

impl Question {
    /// Successor for the given answer, if any.
    pub fn successor(&self, answer: bool) -> Option<i64> {
        if answer {
            self.yes_leads_to
        } else {
            self.no_leads_to
        }
    }

    /// Apply a partial patch in memory, mirroring what the store persists.
    pub fn apply_patch(&mut self, patch: &QuestionPatch) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(position) = patch.order_position {
            self.order_position = position;
        }
        if let Some(value) = patch.yes_leads_to {
            self.yes_leads_to = value;
        }
        if let Some(value) = patch.no_leads_to {
            self.no_leads_to = value;
        }
        if let Some(value) = patch.hint_id {
            self.hint_id = value;
        }
        if let Some(value) = patch.learn_id {
            self.learn_id = value;
        }
        if let Some(value) = patch.action_id {
            self.action_id = value;
        }
        if let Some(value) = patch.terminate_id {
            self.terminate_id = value;
        }
        if let Some(value) = patch.action_trigger {
            self.action_trigger = value;
        }
        if let Some(value) = patch.terminate_trigger {
            self.terminate_trigger = value;
        }
        if let Some(value) = patch.has_upload {
            self.has_upload = value;
        }
    }
}

/// Fields for inserting a node.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub survey_id: i64,
    pub text: String,
    pub order_position: i64,
}

/// Partial update of a node.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears a nullable
/// column, which is how JSON `null` arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_position: Option<i64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub yes_leads_to: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub no_leads_to: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub hint_id: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub learn_id: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub action_id: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub terminate_id: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub action_trigger: Option<Option<Trigger>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub terminate_trigger: Option<Option<Trigger>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_upload: Option<bool>,
}

impl QuestionPatch {
    pub fn is_empty(&self) -> bool {
        *self == QuestionPatch::default()
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// One entry of a bulk reorder batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderUpdate {
    pub id: i64,
    pub order_position: i64,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateSurveyRequest {
    pub name: String,
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RenameSurveyRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SurveyListResponse {
    pub surveys: Vec<Survey>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SurveyDetailsResponse {
    pub survey: Survey,
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateQuestionRequest {
    pub text: String,
    pub order_position: i64,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReorderRequest {
    pub positions: Vec<OrderUpdate>,
}
