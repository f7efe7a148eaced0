/// Create the per-survey editor notes table
pub fn migration() -> String {
    r#"
CREATE TABLE survey_notes (
    survey_id INTEGER PRIMARY KEY,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (survey_id) REFERENCES surveys (id) ON DELETE CASCADE
);
"#
    .to_string()
}
