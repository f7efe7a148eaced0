use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Metadata of a file a respondent attached at a terminate step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Upload {
    pub id: i64,
    pub session_id: i64,
    pub terminate_id: Option<i64>,
    /// Object-store key.
    pub file_path: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewUpload {
    pub session_id: i64,
    pub terminate_id: Option<i64>,
    pub file_path: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
}

/// Query string of the upload endpoint; the file itself is the request body.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UploadQuery {
    pub file_name: String,
    #[serde(default)]
    pub terminate_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UploadListResponse {
    pub uploads: Vec<Upload>,
}
