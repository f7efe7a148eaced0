use ts_rs::TS;

/// Names accepted by [`generate_typescript_definitions`], in output order.
pub const API_TYPE_NAMES: &[&str] = &[
    "Survey",
    "Trigger",
    "Question",
    "QuestionPatch",
    "OrderUpdate",
    "CreateSurveyRequest",
    "RenameSurveyRequest",
    "SurveyListResponse",
    "SurveyDetailsResponse",
    "CreateQuestionRequest",
    "ReorderRequest",
    "Hint",
    "Learn",
    "Action",
    "Terminate",
    "ResourceKind",
    "CreateResourceRequest",
    "ResourcesResponse",
    "Session",
    "Response",
    "TerminationReason",
    "WalkerState",
    "ActionPlan",
    "SessionSnapshot",
    "StartSessionRequest",
    "AnswerRequest",
    "NavigateRequest",
    "SurveyNote",
    "SaveNoteRequest",
    "Upload",
    "UploadQuery",
    "UploadListResponse",
    "ErrorResponse",
    "HealthResponse",
    "VersionResponse",
];

pub fn generate_typescript_definitions(
    type_names: &[&str],
) -> Result<String, Box<dyn std::error::Error>> {
    if type_names.is_empty() {
        return Err("No type names provided".into());
    }

    let mut definitions = Vec::new();

    for name in type_names {
        let type_def = export_type(name)?;
        let cleaned = clean_type(type_def);

        if !cleaned.trim().is_empty() {
            definitions.push(cleaned);
        }
    }

    Ok(definitions.join("\n\n"))
}

fn export_type(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    use crate::*;

    let result = match name {
        "Survey" => Survey::export_to_string()?,
        "Trigger" => Trigger::export_to_string()?,
        "Question" => Question::export_to_string()?,
        "QuestionPatch" => QuestionPatch::export_to_string()?,
        "OrderUpdate" => OrderUpdate::export_to_string()?,
        "CreateSurveyRequest" => CreateSurveyRequest::export_to_string()?,
        "RenameSurveyRequest" => RenameSurveyRequest::export_to_string()?,
        "SurveyListResponse" => SurveyListResponse::export_to_string()?,
        "SurveyDetailsResponse" => SurveyDetailsResponse::export_to_string()?,
        "CreateQuestionRequest" => CreateQuestionRequest::export_to_string()?,
        "ReorderRequest" => ReorderRequest::export_to_string()?,

        "Hint" => Hint::export_to_string()?,
        "Learn" => Learn::export_to_string()?,
        "Action" => Action::export_to_string()?,
        "Terminate" => Terminate::export_to_string()?,
        "ResourceKind" => ResourceKind::export_to_string()?,
        "CreateResourceRequest" => CreateResourceRequest::export_to_string()?,
        "ResourcesResponse" => ResourcesResponse::export_to_string()?,

        "Session" => Session::export_to_string()?,
        "Response" => Response::export_to_string()?,
        "TerminationReason" => TerminationReason::export_to_string()?,
        "WalkerState" => WalkerState::export_to_string()?,
        "ActionPlan" => ActionPlan::export_to_string()?,
        "SessionSnapshot" => SessionSnapshot::export_to_string()?,
        "StartSessionRequest" => StartSessionRequest::export_to_string()?,
        "AnswerRequest" => AnswerRequest::export_to_string()?,
        "NavigateRequest" => NavigateRequest::export_to_string()?,

        "SurveyNote" => SurveyNote::export_to_string()?,
        "SaveNoteRequest" => SaveNoteRequest::export_to_string()?,

        "Upload" => Upload::export_to_string()?,
        "UploadQuery" => UploadQuery::export_to_string()?,
        "UploadListResponse" => UploadListResponse::export_to_string()?,

        "ErrorResponse" => ErrorResponse::export_to_string()?,
        "HealthResponse" => HealthResponse::export_to_string()?,
        "VersionResponse" => VersionResponse::export_to_string()?,

        _ => {
            return Err(format!(
                "Unknown type: '{}'. Available types can be found in shared-types/src/",
                name
            )
            .into());
        }
    };

    Ok(result)
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let lines: Vec<&str> = type_def.lines().collect();

    let filtered: Vec<&str> = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
        })
        .cloned()
        .collect();

    filtered.join("\n").trim().to_string()
}
