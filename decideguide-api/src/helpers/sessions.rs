use decideguide_core::{SessionWalker, StorageError, SurveyError, SurveyResult, SurveyStorage};
use shared_types::SessionSnapshot;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

pub type SharedWalker = Arc<AsyncMutex<SessionWalker>>;

struct CachedWalker {
    survey_id: i64,
    walker: SharedWalker,
}

/// Live walkers keyed by session id.
///
/// A session missing from the cache (after a restart or a tree edit) is
/// rebuilt from storage on first use.
pub struct SessionRegistry {
    storage: Arc<dyn SurveyStorage>,
    walkers: Mutex<HashMap<i64, CachedWalker>>,
}

impl SessionRegistry {
    pub fn new(storage: Arc<dyn SurveyStorage>) -> Self {
        Self {
            storage,
            walkers: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> SurveyResult<MutexGuard<'_, HashMap<i64, CachedWalker>>> {
        self.walkers.lock().map_err(|e| {
            SurveyError::Storage(StorageError::OperationFailed(format!("Lock error: {}", e)))
        })
    }

    fn insert(&self, session_id: i64, survey_id: i64, walker: SharedWalker) -> SurveyResult<()> {
        self.entries()?
            .insert(session_id, CachedWalker { survey_id, walker });
        Ok(())
    }

    pub async fn start(
        &self,
        survey_id: i64,
        respondent: Option<&str>,
    ) -> SurveyResult<SessionSnapshot> {
        let mut walker = SessionWalker::new(Arc::clone(&self.storage));
        walker.start(survey_id, respondent).await?;

        let snapshot = walker.snapshot();
        if let Some(session_id) = walker.session_id() {
            self.insert(session_id, survey_id, Arc::new(AsyncMutex::new(walker)))?;
        }
        Ok(snapshot)
    }

    /// The walker driving `session_id`, resuming it from storage if needed.
    pub async fn walker(&self, session_id: i64) -> SurveyResult<SharedWalker> {
        if let Some(cached) = self.entries()?.get(&session_id) {
            return Ok(Arc::clone(&cached.walker));
        }

        let walker = SessionWalker::resume(Arc::clone(&self.storage), session_id).await?;
        let survey_id = walker.survey().map(|s| s.id).unwrap_or_default();
        debug!(session_id, survey_id, "Cached resumed walker");

        let mut entries = self.entries()?;
        let cached = entries.entry(session_id).or_insert_with(|| CachedWalker {
            survey_id,
            walker: Arc::new(AsyncMutex::new(walker)),
        });
        Ok(Arc::clone(&cached.walker))
    }

    /// Record an answer on the session's walker. A walker the answer
    /// completes leaves the cache; a later request resumes it from storage.
    pub async fn answer(
        &self,
        session_id: i64,
        question_id: i64,
        answer: bool,
    ) -> SurveyResult<SessionSnapshot> {
        let shared = self.walker(session_id).await?;
        let mut walker = shared.lock().await;
        walker.answer(question_id, answer).await?;

        let snapshot = walker.snapshot();
        if walker.state().is_terminated() {
            self.entries()?.remove(&session_id);
            debug!(session_id, "Released completed walker");
        }
        Ok(snapshot)
    }

    /// Wipe the session's answers and continue under the fresh session the
    /// walker opens; the old id stops resolving to this walker.
    pub async fn reset(&self, session_id: i64) -> SurveyResult<SessionSnapshot> {
        let shared = self.walker(session_id).await?;
        let mut walker = shared.lock().await;
        walker.reset().await?;

        let snapshot = walker.snapshot();
        if let (Some(new_id), Some(survey_id)) =
            (walker.session_id(), walker.survey().map(|s| s.id))
        {
            let mut entries = self.entries()?;
            entries.remove(&session_id);
            entries.insert(
                new_id,
                CachedWalker {
                    survey_id,
                    walker: Arc::clone(&shared),
                },
            );
        }
        Ok(snapshot)
    }

    /// Drop every cached walker of `survey_id` so the next request sees the
    /// tree as stored.
    pub fn forget_survey(&self, survey_id: i64) -> SurveyResult<()> {
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|_, cached| cached.survey_id != survey_id);
        debug!(survey_id, dropped = before - entries.len(), "Evicted cached walkers");
        Ok(())
    }

    /// Drop every cached walker. Resources are shared between surveys, so a
    /// resource edit can touch any open session.
    pub fn forget_all(&self) -> SurveyResult<()> {
        let mut entries = self.entries()?;
        debug!(dropped = entries.len(), "Evicted all cached walkers");
        entries.clear();
        Ok(())
    }

    pub fn cached(&self) -> usize {
        self.entries().map(|entries| entries.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decideguide_core::storage::{
        InMemoryStorage, QuestionRepository, ResponseRepository, SurveyRepository,
    };
    use shared_types::{NewQuestion, QuestionPatch, WalkerState};

    async fn two_question_survey(storage: &InMemoryStorage) -> (i64, i64, i64) {
        let survey = storage.create_survey("Registry", None).await.unwrap();
        let mut ids = Vec::new();
        for position in 0..2 {
            let q = storage
                .create_question(NewQuestion {
                    survey_id: survey.id,
                    text: format!("Q{}", position + 1),
                    order_position: position,
                })
                .await
                .unwrap();
            ids.push(q.id);
        }
        storage
            .update_question(
                ids[0],
                &QuestionPatch {
                    yes_leads_to: Some(Some(ids[1])),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (survey.id, ids[0], ids[1])
    }

    #[tokio::test]
    async fn test_start_caches_the_walker() {
        let storage = Arc::new(InMemoryStorage::new());
        let (survey_id, q1, _) = two_question_survey(&storage).await;
        let registry = SessionRegistry::new(storage.clone());

        let snapshot = registry.start(survey_id, Some("ana")).await.unwrap();
        let session_id = snapshot.session.unwrap().id;

        assert_eq!(registry.cached(), 1);
        let walker = registry.walker(session_id).await.unwrap();
        let walker = walker.lock().await;
        assert_eq!(walker.current_question().map(|q| q.id), Some(q1));
    }

    #[tokio::test]
    async fn test_uncached_session_is_resumed() {
        let storage = Arc::new(InMemoryStorage::new());
        let (survey_id, q1, q2) = two_question_survey(&storage).await;
        let session = {
            let registry = SessionRegistry::new(storage.clone());
            registry.start(survey_id, None).await.unwrap().session.unwrap()
        };
        storage.insert_response(session.id, q1, true).await.unwrap();

        let registry = SessionRegistry::new(storage.clone());
        let walker = registry.walker(session.id).await.unwrap();
        let walker = walker.lock().await;

        assert_eq!(walker.state(), WalkerState::InProgress);
        assert_eq!(walker.current_question().map(|q| q.id), Some(q2));
        assert_eq!(walker.progress(), 50);
    }

    #[tokio::test]
    async fn test_reset_rekeys_to_the_new_session() {
        let storage = Arc::new(InMemoryStorage::new());
        let (survey_id, q1, _) = two_question_survey(&storage).await;
        let registry = SessionRegistry::new(storage.clone());
        let old_id = registry
            .start(survey_id, None)
            .await
            .unwrap()
            .session
            .unwrap()
            .id;
        registry
            .walker(old_id)
            .await
            .unwrap()
            .lock()
            .await
            .answer(q1, true)
            .await
            .unwrap();

        let snapshot = registry.reset(old_id).await.unwrap();
        let new_id = snapshot.session.unwrap().id;

        assert_ne!(new_id, old_id);
        assert!(snapshot.responses.is_empty());
        assert_eq!(snapshot.progress, 0);
        assert_eq!(registry.cached(), 1);
        assert!(storage.list_responses(old_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forget_survey_evicts_only_that_survey() {
        let storage = Arc::new(InMemoryStorage::new());
        let (first, _, _) = two_question_survey(&storage).await;
        let (second, _, _) = two_question_survey(&storage).await;
        let registry = SessionRegistry::new(storage.clone());
        registry.start(first, None).await.unwrap();
        registry.start(second, None).await.unwrap();

        registry.forget_survey(first).unwrap();

        assert_eq!(registry.cached(), 1);
    }

    #[tokio::test]
    async fn test_completed_session_leaves_the_cache() {
        let storage = Arc::new(InMemoryStorage::new());
        let (survey_id, q1, q2) = two_question_survey(&storage).await;
        let registry = SessionRegistry::new(storage.clone());
        let session_id = registry
            .start(survey_id, None)
            .await
            .unwrap()
            .session
            .unwrap()
            .id;

        let snapshot = registry.answer(session_id, q1, true).await.unwrap();
        assert_eq!(snapshot.progress, 50);
        assert_eq!(registry.cached(), 1);

        let snapshot = registry.answer(session_id, q2, true).await.unwrap();
        assert!(snapshot.state.is_terminated());
        assert_eq!(registry.cached(), 0);

        let walker = registry.walker(session_id).await.unwrap();
        let walker = walker.lock().await;
        assert!(walker.state().is_terminated());
        assert_eq!(walker.responses().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_answer_keeps_the_walker_cached() {
        let storage = Arc::new(InMemoryStorage::new());
        let (survey_id, _, q2) = two_question_survey(&storage).await;
        let registry = SessionRegistry::new(storage.clone());
        let session_id = registry
            .start(survey_id, None)
            .await
            .unwrap()
            .session
            .unwrap()
            .id;

        assert!(registry.answer(session_id, q2, true).await.is_err());
        assert_eq!(registry.cached(), 1);
    }

    #[tokio::test]
    async fn test_forget_all_empties_the_cache() {
        let storage = Arc::new(InMemoryStorage::new());
        let (first, _, _) = two_question_survey(&storage).await;
        let (second, _, _) = two_question_survey(&storage).await;
        let registry = SessionRegistry::new(storage.clone());
        registry.start(first, None).await.unwrap();
        registry.start(second, None).await.unwrap();

        registry.forget_all().unwrap();

        assert_eq!(registry.cached(), 0);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let registry = SessionRegistry::new(Arc::new(InMemoryStorage::new()));

        let err = registry.walker(42).await.err().unwrap();
        assert!(matches!(err, SurveyError::SessionNotFound(42)));
    }
}
