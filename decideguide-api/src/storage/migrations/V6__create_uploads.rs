/// Create metadata rows for files respondents attach to a session
pub fn migration() -> String {
    r#"
CREATE TABLE uploads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL,
    terminate_id INTEGER,
    file_path TEXT NOT NULL UNIQUE,
    file_name TEXT NOT NULL,
    file_type TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (session_id) REFERENCES sessions (id) ON DELETE CASCADE,
    FOREIGN KEY (terminate_id) REFERENCES terminates (id) ON DELETE SET NULL
);

CREATE INDEX idx_uploads_session
    ON uploads(session_id);
"#
    .to_string()
}
