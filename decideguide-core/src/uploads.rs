//! Files a respondent attaches while walking a tree.

use crate::error::{SurveyError, SurveyResult};
use crate::storage::{ObjectStore, SessionRepository, SurveyStorage, UploadRepository};
use chrono::Utc;
use regex::Regex;
use shared_types::{NewUpload, Upload};
use std::sync::{Arc, OnceLock};
use tracing::{error, info};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn SurveyStorage>,
    objects: Arc<dyn ObjectStore>,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn SurveyStorage>,
        objects: Arc<dyn ObjectStore>,
        max_bytes: usize,
    ) -> Self {
        Self {
            storage,
            objects,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Put the object, then record its metadata row. A failed metadata
    /// write leaves the object in place.
    pub async fn store(
        &self,
        session_id: i64,
        terminate_id: Option<i64>,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> SurveyResult<Upload> {
        self.storage
            .get_session(session_id)
            .await?
            .ok_or(SurveyError::SessionNotFound(session_id))?;

        if file_name.trim().is_empty() {
            return Err(SurveyError::InvalidInput(
                "file name must not be empty".to_string(),
            ));
        }
        if bytes.len() > self.max_bytes {
            return Err(SurveyError::UploadTooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let key = object_key(
            session_id,
            terminate_id,
            Utc::now().timestamp_millis(),
            file_name,
        );
        let size = bytes.len();

        self.objects.put_object(&key, bytes, content_type).await?;

        let upload = self
            .storage
            .record_upload(NewUpload {
                session_id,
                terminate_id,
                file_path: key.clone(),
                file_name: file_name.to_string(),
                file_type: content_type.to_string(),
                file_size: size as i64,
            })
            .await
            .map_err(|e| {
                error!(error = %e, key = %key, "Stored object has no metadata row");
                e
            })?;

        info!(session_id, upload_id = upload.id, size, "Stored upload");
        Ok(upload)
    }

    pub async fn list(&self, session_id: i64) -> SurveyResult<Vec<Upload>> {
        self.storage
            .get_session(session_id)
            .await?
            .ok_or(SurveyError::SessionNotFound(session_id))?;
        Ok(self.storage.list_uploads(session_id).await?)
    }
}

/// Replace everything outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_.-]").unwrap());
    unsafe_chars.replace_all(name, "_").into_owned()
}

pub fn object_key(
    session_id: i64,
    terminate_id: Option<i64>,
    timestamp_millis: i64,
    file_name: &str,
) -> String {
    let terminate = terminate_id.map_or_else(|| "none".to_string(), |id| id.to_string());
    format!(
        "{}/{}/{}-{}",
        session_id,
        terminate,
        timestamp_millis,
        sanitize_file_name(file_name)
    )
}
