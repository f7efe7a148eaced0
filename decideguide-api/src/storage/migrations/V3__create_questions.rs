/// Create the questions table holding tree nodes and their links
pub fn migration() -> String {
    r#"
CREATE TABLE questions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    survey_id INTEGER NOT NULL,
    text TEXT NOT NULL,
    order_position INTEGER NOT NULL,
    yes_leads_to INTEGER,
    no_leads_to INTEGER,
    hint_id INTEGER,
    learn_id INTEGER,
    action_id INTEGER,
    terminate_id INTEGER,
    action_trigger TEXT CHECK (action_trigger IN ('yes', 'no')),
    terminate_trigger TEXT CHECK (terminate_trigger IN ('yes', 'no')),
    has_upload INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (survey_id) REFERENCES surveys (id) ON DELETE CASCADE,
    FOREIGN KEY (yes_leads_to) REFERENCES questions (id) ON DELETE SET NULL,
    FOREIGN KEY (no_leads_to) REFERENCES questions (id) ON DELETE SET NULL,
    FOREIGN KEY (hint_id) REFERENCES hints (id) ON DELETE SET NULL,
    FOREIGN KEY (learn_id) REFERENCES learns (id) ON DELETE SET NULL,
    FOREIGN KEY (action_id) REFERENCES actions (id) ON DELETE SET NULL,
    FOREIGN KEY (terminate_id) REFERENCES terminates (id) ON DELETE SET NULL
);

CREATE INDEX idx_questions_survey_position
    ON questions(survey_id, order_position);
"#
    .to_string()
}
