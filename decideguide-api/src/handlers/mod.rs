pub mod health;
pub mod notes;
pub mod questions;
pub mod resources;
pub mod sessions;
pub mod surveys;
pub mod uploads;

use crate::helpers::sessions::SessionRegistry;
use decideguide_core::storage::ObjectStore;
use decideguide_core::{SurveyCatalog, SurveyStorage, UploadService};
use std::sync::Arc;
use std::time::SystemTime;

pub struct AppState {
    pub catalog: SurveyCatalog,
    pub sessions: SessionRegistry,
    pub uploads: UploadService,
    pub start_time: SystemTime,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn SurveyStorage>,
        objects: Arc<dyn ObjectStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            catalog: SurveyCatalog::new(Arc::clone(&storage)),
            sessions: SessionRegistry::new(Arc::clone(&storage)),
            uploads: UploadService::new(storage, objects, max_upload_bytes),
            start_time: SystemTime::now(),
        }
    }

    pub fn storage(&self) -> Arc<dyn SurveyStorage> {
        self.catalog.storage()
    }
}
