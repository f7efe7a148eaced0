use crate::DbConnection;
use async_trait::async_trait;
use decideguide_core::storage::{
    NoteRepository, QuestionRepository, Resource, ResourceFields, ResourceRepository,
    ResponseRepository, SessionRepository, StorageError, SurveyRepository, UploadRepository,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use shared_types::{
    now_timestamp, NewQuestion, NewUpload, OrderUpdate, Question, QuestionPatch, ResourceKind,
    Response, Session, Survey, SurveyNote, Trigger, Upload,
};
use std::sync::MutexGuard;

const QUESTION_COLUMNS: &str = "id, survey_id, text, order_position, yes_leads_to, no_leads_to, \
     hint_id, learn_id, action_id, terminate_id, action_trigger, terminate_trigger, has_upload, \
     created_at";

const UPLOAD_COLUMNS: &str =
    "id, session_id, terminate_id, file_path, file_name, file_type, file_size, created_at";

pub struct SqliteSurveyStorage {
    connection: DbConnection,
}

impl SqliteSurveyStorage {
    pub fn new(connection: DbConnection) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.connection
            .lock()
            .map_err(|e| StorageError::OperationFailed(format!("Lock error: {}", e)))
    }
}

fn db_error(e: rusqlite::Error) -> StorageError {
    StorageError::OperationFailed(e.to_string())
}

fn survey_from_row(row: &Row) -> rusqlite::Result<Survey> {
    Ok(Survey {
        id: row.get(0)?,
        name: row.get(1)?,
        created_by: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn trigger_column(row: &Row, index: usize) -> rusqlite::Result<Option<Trigger>> {
    let value: Option<String> = row.get(index)?;
    Ok(value.as_deref().and_then(Trigger::parse))
}

fn question_from_row(row: &Row) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get(0)?,
        survey_id: row.get(1)?,
        text: row.get(2)?,
        order_position: row.get(3)?,
        yes_leads_to: row.get(4)?,
        no_leads_to: row.get(5)?,
        hint_id: row.get(6)?,
        learn_id: row.get(7)?,
        action_id: row.get(8)?,
        terminate_id: row.get(9)?,
        action_trigger: trigger_column(row, 10)?,
        terminate_trigger: trigger_column(row, 11)?,
        has_upload: row.get(12)?,
        created_at: row.get(13)?,
    })
}

fn session_from_row(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        survey_id: row.get(1)?,
        respondent: row.get(2)?,
        started_at: row.get(3)?,
        completed_at: row.get(4)?,
    })
}

fn response_from_row(row: &Row) -> rusqlite::Result<Response> {
    Ok(Response {
        id: row.get(0)?,
        session_id: row.get(1)?,
        question_id: row.get(2)?,
        answer: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn upload_from_row(row: &Row) -> rusqlite::Result<Upload> {
    Ok(Upload {
        id: row.get(0)?,
        session_id: row.get(1)?,
        terminate_id: row.get(2)?,
        file_path: row.get(3)?,
        file_name: row.get(4)?,
        file_type: row.get(5)?,
        file_size: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn fetch_question(conn: &Connection, question_id: i64) -> Result<Option<Question>, StorageError> {
    conn.query_row(
        &format!("SELECT {} FROM questions WHERE id = ?1", QUESTION_COLUMNS),
        params![question_id],
        question_from_row,
    )
    .optional()
    .map_err(db_error)
}

fn fetch_session(conn: &Connection, session_id: i64) -> Result<Option<Session>, StorageError> {
    conn.query_row(
        "SELECT id, survey_id, respondent, started_at, completed_at
         FROM sessions WHERE id = ?1",
        params![session_id],
        session_from_row,
    )
    .optional()
    .map_err(db_error)
}

fn fetch_response(conn: &Connection, response_id: i64) -> Result<Option<Response>, StorageError> {
    conn.query_row(
        "SELECT id, session_id, question_id, answer, created_at, updated_at
         FROM responses WHERE id = ?1",
        params![response_id],
        response_from_row,
    )
    .optional()
    .map_err(db_error)
}

/// Columns of `questions` pointing at a resource kind: the reference and,
/// for actions and terminates, its trigger.
fn reference_columns(kind: ResourceKind) -> (&'static str, Option<&'static str>) {
    match kind {
        ResourceKind::Hint => ("hint_id", None),
        ResourceKind::Learn => ("learn_id", None),
        ResourceKind::Action => ("action_id", Some("action_trigger")),
        ResourceKind::Terminate => ("terminate_id", Some("terminate_trigger")),
    }
}

fn title_column(kind: ResourceKind) -> &'static str {
    if kind.has_title() {
        "title"
    } else {
        "NULL"
    }
}

#[async_trait]
impl SurveyRepository for SqliteSurveyStorage {
    async fn create_survey(
        &self,
        name: &str,
        created_by: Option<&str>,
    ) -> Result<Survey, StorageError> {
        let conn = self.lock()?;
        let created_at = now_timestamp();

        conn.execute(
            "INSERT INTO surveys (name, created_by, created_at) VALUES (?1, ?2, ?3)",
            params![name, created_by, created_at],
        )
        .map_err(db_error)?;

        Ok(Survey {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            created_by: created_by.map(str::to_string),
            created_at,
        })
    }

    async fn get_survey(&self, survey_id: i64) -> Result<Option<Survey>, StorageError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, created_by, created_at FROM surveys WHERE id = ?1",
            params![survey_id],
            survey_from_row,
        )
        .optional()
        .map_err(db_error)
    }

    async fn list_surveys(&self) -> Result<Vec<Survey>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, created_by, created_at FROM surveys
                 ORDER BY created_at DESC, id DESC",
            )
            .map_err(db_error)?;
        let surveys = stmt
            .query_map([], survey_from_row)
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(surveys)
    }

    async fn rename_survey(&self, survey_id: i64, name: &str) -> Result<Survey, StorageError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE surveys SET name = ?1 WHERE id = ?2",
                params![name, survey_id],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("survey {}", survey_id)));
        }

        conn.query_row(
            "SELECT id, name, created_by, created_at FROM surveys WHERE id = ?1",
            params![survey_id],
            survey_from_row,
        )
        .map_err(db_error)
    }

    async fn delete_survey(&self, survey_id: i64) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_error)?;

        tx.execute(
            "DELETE FROM uploads WHERE session_id IN
                (SELECT id FROM sessions WHERE survey_id = ?1)",
            params![survey_id],
        )
        .map_err(db_error)?;
        tx.execute(
            "DELETE FROM responses WHERE session_id IN
                (SELECT id FROM sessions WHERE survey_id = ?1)",
            params![survey_id],
        )
        .map_err(db_error)?;
        tx.execute(
            "DELETE FROM sessions WHERE survey_id = ?1",
            params![survey_id],
        )
        .map_err(db_error)?;
        tx.execute(
            "DELETE FROM survey_notes WHERE survey_id = ?1",
            params![survey_id],
        )
        .map_err(db_error)?;
        // Successor links stay inside one survey, clear them before the rows go.
        tx.execute(
            "UPDATE questions SET yes_leads_to = NULL, no_leads_to = NULL WHERE survey_id = ?1",
            params![survey_id],
        )
        .map_err(db_error)?;
        tx.execute(
            "DELETE FROM questions WHERE survey_id = ?1",
            params![survey_id],
        )
        .map_err(db_error)?;
        let removed = tx
            .execute("DELETE FROM surveys WHERE id = ?1", params![survey_id])
            .map_err(db_error)?;
        if removed == 0 {
            return Err(StorageError::NotFound(format!("survey {}", survey_id)));
        }

        tx.commit().map_err(db_error)
    }
}

#[async_trait]
impl QuestionRepository for SqliteSurveyStorage {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, StorageError> {
        let conn = self.lock()?;
        let created_at = now_timestamp();

        conn.execute(
            "INSERT INTO questions (survey_id, text, order_position, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                question.survey_id,
                question.text,
                question.order_position,
                created_at
            ],
        )
        .map_err(db_error)?;

        let id = conn.last_insert_rowid();
        fetch_question(&conn, id)?
            .ok_or_else(|| StorageError::NotFound(format!("question {}", id)))
    }

    async fn get_question(&self, question_id: i64) -> Result<Option<Question>, StorageError> {
        let conn = self.lock()?;
        fetch_question(&conn, question_id)
    }

    async fn list_questions(&self, survey_id: i64) -> Result<Vec<Question>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM questions WHERE survey_id = ?1 ORDER BY order_position, id",
                QUESTION_COLUMNS
            ))
            .map_err(db_error)?;
        let questions = stmt
            .query_map(params![survey_id], question_from_row)
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(questions)
    }

    async fn update_question(
        &self,
        question_id: i64,
        patch: &QuestionPatch,
    ) -> Result<Question, StorageError> {
        let conn = self.lock()?;
        let mut question = fetch_question(&conn, question_id)?
            .ok_or_else(|| StorageError::NotFound(format!("question {}", question_id)))?;
        question.apply_patch(patch);

        conn.execute(
            "UPDATE questions SET
                text = ?1, order_position = ?2, yes_leads_to = ?3, no_leads_to = ?4,
                hint_id = ?5, learn_id = ?6, action_id = ?7, terminate_id = ?8,
                action_trigger = ?9, terminate_trigger = ?10, has_upload = ?11
             WHERE id = ?12",
            params![
                question.text,
                question.order_position,
                question.yes_leads_to,
                question.no_leads_to,
                question.hint_id,
                question.learn_id,
                question.action_id,
                question.terminate_id,
                question.action_trigger.map(|t| t.as_str()),
                question.terminate_trigger.map(|t| t.as_str()),
                question.has_upload,
                question_id,
            ],
        )
        .map_err(db_error)?;

        Ok(question)
    }

    async fn delete_question(&self, question_id: i64) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_error)?;

        tx.execute(
            "UPDATE questions SET yes_leads_to = NULL WHERE yes_leads_to = ?1",
            params![question_id],
        )
        .map_err(db_error)?;
        tx.execute(
            "UPDATE questions SET no_leads_to = NULL WHERE no_leads_to = ?1",
            params![question_id],
        )
        .map_err(db_error)?;
        tx.execute(
            "DELETE FROM responses WHERE question_id = ?1",
            params![question_id],
        )
        .map_err(db_error)?;
        let removed = tx
            .execute("DELETE FROM questions WHERE id = ?1", params![question_id])
            .map_err(db_error)?;
        if removed == 0 {
            return Err(StorageError::NotFound(format!("question {}", question_id)));
        }

        tx.commit().map_err(db_error)
    }

    async fn reorder_questions(&self, updates: &[OrderUpdate]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_error)?;

        {
            let mut stmt = tx
                .prepare("UPDATE questions SET order_position = ?1 WHERE id = ?2")
                .map_err(db_error)?;
            for update in updates {
                let changed = stmt
                    .execute(params![update.order_position, update.id])
                    .map_err(db_error)?;
                if changed == 0 {
                    return Err(StorageError::NotFound(format!("question {}", update.id)));
                }
            }
        }

        tx.commit().map_err(db_error)
    }
}

#[async_trait]
impl SessionRepository for SqliteSurveyStorage {
    async fn create_session(
        &self,
        survey_id: i64,
        respondent: Option<&str>,
    ) -> Result<Session, StorageError> {
        let conn = self.lock()?;
        let started_at = now_timestamp();

        conn.execute(
            "INSERT INTO sessions (survey_id, respondent, started_at) VALUES (?1, ?2, ?3)",
            params![survey_id, respondent, started_at],
        )
        .map_err(db_error)?;

        Ok(Session {
            id: conn.last_insert_rowid(),
            survey_id,
            respondent: respondent.map(str::to_string),
            started_at,
            completed_at: None,
        })
    }

    async fn get_session(&self, session_id: i64) -> Result<Option<Session>, StorageError> {
        let conn = self.lock()?;
        fetch_session(&conn, session_id)
    }

    async fn list_sessions(&self, survey_id: i64) -> Result<Vec<Session>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, survey_id, respondent, started_at, completed_at
                 FROM sessions WHERE survey_id = ?1 ORDER BY id",
            )
            .map_err(db_error)?;
        let sessions = stmt
            .query_map(params![survey_id], session_from_row)
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(sessions)
    }

    async fn complete_session(&self, session_id: i64) -> Result<Session, StorageError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE sessions SET completed_at = ?1 WHERE id = ?2",
                params![now_timestamp(), session_id],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("session {}", session_id)));
        }

        fetch_session(&conn, session_id)?
            .ok_or_else(|| StorageError::NotFound(format!("session {}", session_id)))
    }
}

#[async_trait]
impl ResponseRepository for SqliteSurveyStorage {
    async fn insert_response(
        &self,
        session_id: i64,
        question_id: i64,
        answer: bool,
    ) -> Result<Response, StorageError> {
        let conn = self.lock()?;
        let now = now_timestamp();

        conn.execute(
            "INSERT INTO responses (session_id, question_id, answer, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![session_id, question_id, answer, now],
        )
        .map_err(db_error)?;

        Ok(Response {
            id: conn.last_insert_rowid(),
            session_id,
            question_id,
            answer,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_response(
        &self,
        response_id: i64,
        answer: bool,
    ) -> Result<Response, StorageError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE responses SET answer = ?1, updated_at = ?2 WHERE id = ?3",
                params![answer, now_timestamp(), response_id],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("response {}", response_id)));
        }

        fetch_response(&conn, response_id)?
            .ok_or_else(|| StorageError::NotFound(format!("response {}", response_id)))
    }

    async fn list_responses(&self, session_id: i64) -> Result<Vec<Response>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, session_id, question_id, answer, created_at, updated_at
                 FROM responses WHERE session_id = ?1 ORDER BY id",
            )
            .map_err(db_error)?;
        let responses = stmt
            .query_map(params![session_id], response_from_row)
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(responses)
    }

    async fn delete_responses_after(
        &self,
        session_id: i64,
        response_id: i64,
    ) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM responses WHERE session_id = ?1 AND id > ?2",
            params![session_id, response_id],
        )
        .map_err(db_error)
    }

    async fn delete_responses(&self, session_id: i64) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM responses WHERE session_id = ?1",
            params![session_id],
        )
        .map_err(db_error)
    }
}

#[async_trait]
impl<R: Resource> ResourceRepository<R> for SqliteSurveyStorage {
    async fn create_resource(&self, fields: ResourceFields) -> Result<R, StorageError> {
        let conn = self.lock()?;
        let kind = R::KIND;
        let created_at = now_timestamp();

        let inserted = if kind.has_title() {
            conn.execute(
                &format!(
                    "INSERT INTO {} (title, content, created_at) VALUES (?1, ?2, ?3)",
                    kind.table()
                ),
                params![fields.title.as_deref().unwrap_or_default(), fields.content, created_at],
            )
        } else {
            conn.execute(
                &format!(
                    "INSERT INTO {} (content, created_at) VALUES (?1, ?2)",
                    kind.table()
                ),
                params![fields.content, created_at],
            )
        };
        inserted.map_err(db_error)?;

        Ok(R::from_row(
            conn.last_insert_rowid(),
            fields.title,
            fields.content,
            created_at,
        ))
    }

    async fn get_resource(&self, resource_id: i64) -> Result<Option<R>, StorageError> {
        let conn = self.lock()?;
        let kind = R::KIND;
        conn.query_row(
            &format!(
                "SELECT id, {}, content, created_at FROM {} WHERE id = ?1",
                title_column(kind),
                kind.table()
            ),
            params![resource_id],
            |row| Ok(R::from_row(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()
        .map_err(db_error)
    }

    async fn list_resources(&self) -> Result<Vec<R>, StorageError> {
        let conn = self.lock()?;
        let kind = R::KIND;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, {}, content, created_at FROM {} ORDER BY id",
                title_column(kind),
                kind.table()
            ))
            .map_err(db_error)?;
        let resources = stmt
            .query_map([], |row| {
                Ok(R::from_row(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(resources)
    }

    async fn update_resource(
        &self,
        resource_id: i64,
        fields: ResourceFields,
    ) -> Result<R, StorageError> {
        let conn = self.lock()?;
        let kind = R::KIND;

        let changed = if kind.has_title() {
            conn.execute(
                &format!(
                    "UPDATE {} SET title = ?1, content = ?2 WHERE id = ?3",
                    kind.table()
                ),
                params![
                    fields.title.as_deref().unwrap_or_default(),
                    fields.content,
                    resource_id
                ],
            )
        } else {
            conn.execute(
                &format!("UPDATE {} SET content = ?1 WHERE id = ?2", kind.table()),
                params![fields.content, resource_id],
            )
        }
        .map_err(db_error)?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("{} {}", kind, resource_id)));
        }

        conn.query_row(
            &format!(
                "SELECT id, {}, content, created_at FROM {} WHERE id = ?1",
                title_column(kind),
                kind.table()
            ),
            params![resource_id],
            |row| Ok(R::from_row(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .map_err(db_error)
    }

    async fn delete_resource(&self, resource_id: i64) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let kind = R::KIND;
        let (reference, trigger) = reference_columns(kind);
        let tx = conn.transaction().map_err(db_error)?;

        let clear = match trigger {
            Some(trigger) => format!(
                "UPDATE questions SET {reference} = NULL, {trigger} = NULL WHERE {reference} = ?1"
            ),
            None => format!("UPDATE questions SET {reference} = NULL WHERE {reference} = ?1"),
        };
        tx.execute(&clear, params![resource_id]).map_err(db_error)?;

        let removed = tx
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
                params![resource_id],
            )
            .map_err(db_error)?;
        if removed == 0 {
            return Err(StorageError::NotFound(format!("{} {}", kind, resource_id)));
        }

        tx.commit().map_err(db_error)
    }
}

#[async_trait]
impl NoteRepository for SqliteSurveyStorage {
    async fn get_note(&self, survey_id: i64) -> Result<Option<SurveyNote>, StorageError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT survey_id, content, created_at, updated_at
             FROM survey_notes WHERE survey_id = ?1",
            params![survey_id],
            |row| {
                Ok(SurveyNote {
                    survey_id: row.get(0)?,
                    content: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(db_error)
    }

    async fn save_note(&self, survey_id: i64, content: &str) -> Result<SurveyNote, StorageError> {
        let conn = self.lock()?;
        let now = now_timestamp();

        conn.execute(
            "INSERT INTO survey_notes (survey_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(survey_id) DO UPDATE SET
                content = excluded.content,
                updated_at = excluded.updated_at",
            params![survey_id, content, now],
        )
        .map_err(db_error)?;

        conn.query_row(
            "SELECT survey_id, content, created_at, updated_at
             FROM survey_notes WHERE survey_id = ?1",
            params![survey_id],
            |row| {
                Ok(SurveyNote {
                    survey_id: row.get(0)?,
                    content: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            },
        )
        .map_err(db_error)
    }
}

#[async_trait]
impl UploadRepository for SqliteSurveyStorage {
    async fn record_upload(&self, upload: NewUpload) -> Result<Upload, StorageError> {
        let conn = self.lock()?;
        let created_at = now_timestamp();

        conn.execute(
            "INSERT INTO uploads
                (session_id, terminate_id, file_path, file_name, file_type, file_size, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                upload.session_id,
                upload.terminate_id,
                upload.file_path,
                upload.file_name,
                upload.file_type,
                upload.file_size,
                created_at,
            ],
        )
        .map_err(db_error)?;

        Ok(Upload {
            id: conn.last_insert_rowid(),
            session_id: upload.session_id,
            terminate_id: upload.terminate_id,
            file_path: upload.file_path,
            file_name: upload.file_name,
            file_type: upload.file_type,
            file_size: upload.file_size,
            created_at,
        })
    }

    async fn list_uploads(&self, session_id: i64) -> Result<Vec<Upload>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM uploads WHERE session_id = ?1 ORDER BY id",
                UPLOAD_COLUMNS
            ))
            .map_err(db_error)?;
        let uploads = stmt
            .query_map(params![session_id], upload_from_row)
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(uploads)
    }
}
