//! Decision-tree survey logic: the tree editor, the session walker, the plan
//! collector and the catalog around them, all written against the repository
//! traits in [`storage`].

pub mod catalog;
pub mod editor;
pub mod error;
pub mod plan;
pub mod storage;
pub mod uploads;
pub mod walker;

#[cfg(test)]
mod test_support;

pub use catalog::SurveyCatalog;
pub use editor::TreeEditor;
pub use error::{SurveyError, SurveyResult};
pub use plan::{collect_actions, progress, QuestionNode};
pub use storage::{StorageError, SurveyStorage};
pub use uploads::{UploadService, DEFAULT_MAX_UPLOAD_BYTES};
pub use walker::SessionWalker;
