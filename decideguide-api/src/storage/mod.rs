pub mod migrations;
pub mod objects;
pub mod sqlite;

pub use objects::LocalObjectStore;
pub use sqlite::SqliteSurveyStorage;
