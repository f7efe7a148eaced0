/// Create the surveys table, one row per decision tree
pub fn migration() -> String {
    r#"
CREATE TABLE surveys (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_by TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX idx_surveys_created_at
    ON surveys(created_at);
"#
    .to_string()
}
