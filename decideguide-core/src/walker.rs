//! Respondent-side traversal of one decision tree.
//!
//! A [`SessionWalker`] owns the in-memory view of one session: the tree's
//! nodes, the answered path, the current question and, once the walk ends,
//! the action plan. Every operation first performs all of its storage calls
//! and only then commits the new state, so a failed call leaves the walker
//! exactly as it was apart from [`SessionWalker::error`].

use crate::error::{SurveyError, SurveyResult};
use crate::plan::{collect_actions, load_nodes, progress, QuestionNode};
use crate::storage::{ResponseRepository, SessionRepository, SurveyRepository, SurveyStorage};
use shared_types::{
    ActionPlan, Question, Response, Session, SessionSnapshot, Survey, TerminationReason,
    WalkerState,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct SessionWalker {
    storage: Arc<dyn SurveyStorage>,
    survey: Option<Survey>,
    session: Option<Session>,
    nodes: Vec<QuestionNode>,
    responses: Vec<Response>,
    current: Option<i64>,
    state: WalkerState,
    progress: u8,
    plan: ActionPlan,
    error: Option<String>,
}

/// Where an answer leads.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Terminate(String),
    End,
    Advance(i64),
}

/// State computed by an operation, committed only once storage agreed.
struct Transition {
    survey: Survey,
    session: Session,
    nodes: Option<Vec<QuestionNode>>,
    responses: Vec<Response>,
    current: Option<i64>,
    state: WalkerState,
    progress: u8,
    plan: ActionPlan,
}

impl SessionWalker {
    pub fn new(storage: Arc<dyn SurveyStorage>) -> Self {
        Self {
            storage,
            survey: None,
            session: None,
            nodes: Vec::new(),
            responses: Vec::new(),
            current: None,
            state: WalkerState::NotStarted,
            progress: 0,
            plan: ActionPlan::default(),
            error: None,
        }
    }

    /// Rebuild a walker for an existing session from what storage holds.
    pub async fn resume(storage: Arc<dyn SurveyStorage>, session_id: i64) -> SurveyResult<Self> {
        let session = storage
            .get_session(session_id)
            .await?
            .ok_or(SurveyError::SessionNotFound(session_id))?;
        let survey = storage
            .get_survey(session.survey_id)
            .await?
            .ok_or(SurveyError::SurveyNotFound(session.survey_id))?;
        let nodes = load_nodes(storage.as_ref(), survey.id).await?;
        if nodes.is_empty() {
            return Err(SurveyError::EmptySurvey(survey.id));
        }
        let responses = storage.list_responses(session.id).await?;

        let last = responses
            .last()
            .and_then(|r| find_node(&nodes, r.question_id).map(|node| (node, r.answer)));
        let last_step = last.map(|(node, answer)| resolve(&nodes, node, answer));

        let mut walker = Self::new(storage);

        if session.is_completed() {
            let terminate_message = match &last_step {
                Some(Step::Terminate(message)) => Some(message.clone()),
                _ => None,
            };
            walker.state = WalkerState::Terminated {
                reason: if terminate_message.is_some() {
                    TerminationReason::EarlyExit
                } else {
                    TerminationReason::Normal
                },
            };
            walker.plan = ActionPlan {
                actions: collect_actions(&nodes, &responses),
                terminate_message,
            };
            walker.progress = 100;
        } else {
            walker.current = match (last_step, last) {
                (None, _) => nodes.first().map(QuestionNode::id),
                (Some(Step::Advance(next)), _) => Some(next),
                // The walk ended but completing the session never reached
                // storage; let the respondent answer the last question again.
                (Some(_), Some((node, _))) => Some(node.id()),
                (Some(_), None) => nodes.first().map(QuestionNode::id),
            };
            walker.state = WalkerState::InProgress;
            walker.progress = progress(responses.len(), nodes.len());
        }

        debug!(
            session_id = session.id,
            answered = responses.len(),
            state = ?walker.state,
            "Resumed session"
        );

        walker.survey = Some(survey);
        walker.session = Some(session);
        walker.nodes = nodes;
        walker.responses = responses;
        Ok(walker)
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    pub fn survey(&self) -> Option<&Survey> {
        self.survey.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<i64> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn nodes(&self) -> &[QuestionNode] {
        &self.nodes
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current
            .and_then(|id| find_node(&self.nodes, id))
            .map(|node| &node.question)
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn action_plan(&self) -> &ActionPlan {
        &self.plan
    }

    /// The finished plan once terminated, otherwise what the answers so far
    /// would contribute.
    pub fn current_plan(&self) -> ActionPlan {
        if self.state.is_terminated() {
            return self.plan.clone();
        }
        ActionPlan {
            actions: collect_actions(&self.nodes, &self.responses),
            terminate_message: None,
        }
    }

    /// Message of the last failed operation, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session.clone(),
            survey: self.survey.clone(),
            state: self.state,
            current_question: self.current_question().cloned(),
            progress: self.progress,
            total_questions: self.nodes.len(),
            responses: self.responses.clone(),
            action_plan: self.plan.clone(),
            error: self.error.clone(),
        }
    }

    /// Open a new session on `survey_id` positioned at its first question.
    pub async fn start(&mut self, survey_id: i64, respondent: Option<&str>) -> SurveyResult<()> {
        let outcome = self.prepare_start(survey_id, respondent).await;
        self.commit(outcome)
    }

    async fn prepare_start(
        &self,
        survey_id: i64,
        respondent: Option<&str>,
    ) -> SurveyResult<Transition> {
        let survey = self
            .storage
            .get_survey(survey_id)
            .await?
            .ok_or(SurveyError::SurveyNotFound(survey_id))?;

        let nodes = load_nodes(self.storage.as_ref(), survey_id).await?;
        let first = nodes
            .first()
            .map(QuestionNode::id)
            .ok_or(SurveyError::EmptySurvey(survey_id))?;

        let session = self.storage.create_session(survey_id, respondent).await?;
        info!(
            survey_id,
            session_id = session.id,
            question_count = nodes.len(),
            "Started survey session"
        );

        Ok(Transition {
            survey,
            session,
            nodes: Some(nodes),
            responses: Vec::new(),
            current: Some(first),
            state: WalkerState::InProgress,
            progress: 0,
            plan: ActionPlan::default(),
        })
    }

    /// Record `answer` for `question_id` and move to whatever it leads to.
    pub async fn answer(&mut self, question_id: i64, answer: bool) -> SurveyResult<()> {
        let outcome = self.prepare_answer(question_id, answer).await;
        self.commit(outcome)
    }

    async fn prepare_answer(&self, question_id: i64, answer: bool) -> SurveyResult<Transition> {
        let (survey, session) = self.active()?;
        let node =
            find_node(&self.nodes, question_id).ok_or(SurveyError::QuestionNotFound(question_id))?;

        let existing = self
            .responses
            .iter()
            .position(|r| r.question_id == question_id);

        let responses = match existing {
            Some(index) => {
                let updated = self
                    .storage
                    .update_response(self.responses[index].id, answer)
                    .await?;
                let discarded = self
                    .storage
                    .delete_responses_after(session.id, updated.id)
                    .await?;
                if discarded > 0 {
                    debug!(
                        session_id = session.id,
                        question_id, discarded, "Discarded responses after changed answer"
                    );
                }
                let mut kept = self.responses[..index].to_vec();
                kept.push(updated);
                kept
            }
            None => {
                if self.current != Some(question_id) {
                    return Err(SurveyError::NotOnPath(question_id));
                }
                // Rows past the in-memory path are left behind by navigation.
                let last_kept = self.responses.last().map_or(0, |r| r.id);
                self.storage
                    .delete_responses_after(session.id, last_kept)
                    .await?;
                let created = self
                    .storage
                    .insert_response(session.id, question_id, answer)
                    .await?;
                let mut extended = self.responses.clone();
                extended.push(created);
                extended
            }
        };

        let transition = match resolve(&self.nodes, node, answer) {
            Step::Advance(next) => Transition {
                survey: survey.clone(),
                session: session.clone(),
                nodes: None,
                current: Some(next),
                state: WalkerState::InProgress,
                progress: progress(responses.len(), self.nodes.len()),
                plan: ActionPlan::default(),
                responses,
            },
            step => {
                let (reason, terminate_message) = match step {
                    Step::Terminate(message) => (TerminationReason::EarlyExit, Some(message)),
                    _ => (TerminationReason::Normal, None),
                };
                let actions = collect_actions(&self.nodes, &responses);
                let completed = self.storage.complete_session(session.id).await?;
                info!(
                    session_id = session.id,
                    reason = ?reason,
                    action_count = actions.len(),
                    "Survey session completed"
                );
                Transition {
                    survey: survey.clone(),
                    session: completed,
                    nodes: None,
                    current: None,
                    state: WalkerState::Terminated { reason },
                    progress: 100,
                    plan: ActionPlan {
                        actions,
                        terminate_message,
                    },
                    responses,
                }
            }
        };

        Ok(transition)
    }

    /// Delete every response of the session and start over on the same tree
    /// with a fresh session.
    pub async fn reset(&mut self) -> SurveyResult<()> {
        let outcome = self.prepare_reset().await;
        self.commit(outcome)
    }

    async fn prepare_reset(&self) -> SurveyResult<Transition> {
        let (Some(survey), Some(session)) = (&self.survey, &self.session) else {
            return Err(SurveyError::NoActiveSession);
        };

        let deleted = self.storage.delete_responses(session.id).await?;
        debug!(session_id = session.id, deleted, "Cleared responses for reset");

        self.prepare_start(survey.id, session.respondent.as_deref())
            .await
    }

    /// Move the current-question pointer to `question_id`.
    ///
    /// When the question was already answered the in-memory path is cut right
    /// after it; stored rows stay until the next answer replaces them.
    pub fn navigate_to_question(&mut self, question_id: i64) -> SurveyResult<()> {
        match self.prepare_navigate(question_id) {
            Ok(kept) => {
                if let Some(kept) = kept {
                    self.responses = kept;
                }
                self.current = Some(question_id);
                self.state = WalkerState::InProgress;
                self.progress = progress(self.responses.len(), self.nodes.len());
                self.plan = ActionPlan::default();
                self.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn prepare_navigate(&self, question_id: i64) -> SurveyResult<Option<Vec<Response>>> {
        if self.session.is_none() {
            return Err(SurveyError::NoActiveSession);
        }
        if find_node(&self.nodes, question_id).is_none() {
            return Err(SurveyError::QuestionNotFound(question_id));
        }

        Ok(self
            .responses
            .iter()
            .position(|r| r.question_id == question_id)
            .map(|index| self.responses[..=index].to_vec()))
    }

    fn active(&self) -> SurveyResult<(&Survey, &Session)> {
        let (Some(survey), Some(session)) = (&self.survey, &self.session) else {
            return Err(SurveyError::NoActiveSession);
        };
        match self.state {
            WalkerState::InProgress => Ok((survey, session)),
            WalkerState::Terminated { .. } => Err(SurveyError::SessionCompleted(session.id)),
            WalkerState::NotStarted => Err(SurveyError::NoActiveSession),
        }
    }

    fn commit(&mut self, outcome: SurveyResult<Transition>) -> SurveyResult<()> {
        match outcome {
            Ok(transition) => {
                self.survey = Some(transition.survey);
                self.session = Some(transition.session);
                if let Some(nodes) = transition.nodes {
                    self.nodes = nodes;
                }
                self.responses = transition.responses;
                self.current = transition.current;
                self.state = transition.state;
                self.progress = transition.progress;
                self.plan = transition.plan;
                self.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, e: SurveyError) -> SurveyError {
        error!(error = %e, session_id = ?self.session_id(), "Survey session operation failed");
        self.error = Some(e.to_string());
        e
    }
}

fn find_node(nodes: &[QuestionNode], question_id: i64) -> Option<&QuestionNode> {
    nodes.iter().find(|n| n.id() == question_id)
}

/// A firing terminate wins over any successor; a successor outside the tree
/// counts as none.
fn resolve(nodes: &[QuestionNode], node: &QuestionNode, answer: bool) -> Step {
    if let Some(terminate) = node.fired_terminate(answer) {
        return Step::Terminate(terminate.content.clone());
    }

    match node.question.successor(answer) {
        None => Step::End,
        Some(next) if find_node(nodes, next).is_some() => Step::Advance(next),
        Some(next) => {
            warn!(
                question_id = node.id(),
                successor = next,
                "Successor is not part of the tree, treating the question as terminal"
            );
            Step::End
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use crate::test_support::TreeBuilder;
    use shared_types::Trigger;

    async fn walker_for(storage: &InMemoryStorage) -> SessionWalker {
        SessionWalker::new(Arc::new(storage.clone()))
    }

    /// Q1(yes→Q2, no→terminate T1), Q2(terminate T2 unconditional, no→Q1).
    async fn branching_tree(storage: &InMemoryStorage) -> (i64, i64, i64) {
        let mut tree = TreeBuilder::new(storage, "Tenancy check").await;
        let q1 = tree.question("Do you rent?").await;
        let q2 = tree.question("Is the deposit protected?").await;
        tree.link(q1, Some(q2), None).await;
        tree.link(q2, None, Some(q1)).await;
        tree.terminate(q1, "Renters only", Some(Trigger::No)).await;
        tree.terminate(q2, "Contact your council", None).await;
        (tree.survey_id, q1, q2)
    }

    #[tokio::test]
    async fn test_start_positions_at_first_question() {
        let storage = InMemoryStorage::new();
        let mut tree = TreeBuilder::new(&storage, "Ordering").await;
        let second = tree.question_at("Second", 5).await;
        let first = tree.question_at("First", 1).await;

        let mut walker = walker_for(&storage).await;
        assert_eq!(walker.state(), WalkerState::NotStarted);

        walker.start(tree.survey_id, Some("alice")).await.unwrap();

        assert_eq!(walker.state(), WalkerState::InProgress);
        assert_eq!(walker.current_question().map(|q| q.id), Some(first));
        assert_eq!(walker.progress(), 0);
        assert_eq!(walker.nodes().len(), 2);
        assert_ne!(first, second);
        assert_eq!(
            walker.session().and_then(|s| s.respondent.as_deref()),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn test_start_rejects_empty_tree() {
        let storage = InMemoryStorage::new();
        let tree = TreeBuilder::new(&storage, "Empty").await;

        let mut walker = walker_for(&storage).await;
        let err = walker.start(tree.survey_id, None).await.unwrap_err();

        assert!(matches!(err, SurveyError::EmptySurvey(_)));
        assert_eq!(walker.state(), WalkerState::NotStarted);
        assert!(walker.error().unwrap().contains("No questions"));
    }

    #[tokio::test]
    async fn test_answer_without_session_fails() {
        let storage = InMemoryStorage::new();
        let mut walker = walker_for(&storage).await;

        let err = walker.answer(1, true).await.unwrap_err();
        assert!(matches!(err, SurveyError::NoActiveSession));
        assert_eq!(walker.error(), Some("No active session"));
    }

    #[tokio::test]
    async fn test_terminate_on_no_ends_with_its_message() {
        let storage = InMemoryStorage::new();
        let (survey_id, q1, _) = branching_tree(&storage).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();
        walker.answer(q1, false).await.unwrap();

        assert_eq!(
            walker.state(),
            WalkerState::Terminated {
                reason: TerminationReason::EarlyExit
            }
        );
        assert_eq!(
            walker.action_plan().terminate_message.as_deref(),
            Some("Renters only")
        );
        assert!(walker.action_plan().actions.is_empty());
        assert!(walker.current_question().is_none());
        assert_eq!(walker.progress(), 100);
        assert!(walker.session().unwrap().is_completed());
    }

    #[tokio::test]
    async fn test_unconditional_terminate_bypasses_successor() {
        let storage = InMemoryStorage::new();
        let (survey_id, q1, q2) = branching_tree(&storage).await;

        for answer in [true, false] {
            let mut walker = walker_for(&storage).await;
            walker.start(survey_id, None).await.unwrap();
            walker.answer(q1, true).await.unwrap();
            assert_eq!(walker.current_question().map(|q| q.id), Some(q2));
            assert_eq!(walker.progress(), 50);

            walker.answer(q2, answer).await.unwrap();

            assert_eq!(
                walker.state(),
                WalkerState::Terminated {
                    reason: TerminationReason::EarlyExit
                }
            );
            assert_eq!(
                walker.action_plan().terminate_message.as_deref(),
                Some("Contact your council")
            );
        }
    }

    #[tokio::test]
    async fn test_missing_successor_ends_normally_with_plan() {
        let storage = InMemoryStorage::new();
        let mut tree = TreeBuilder::new(&storage, "Plan").await;
        let q1 = tree.question("Own a car?").await;
        let q2 = tree.question("Is it insured?").await;
        let q3 = tree.question("Unreached").await;
        tree.link(q1, Some(q2), Some(q2)).await;
        tree.action(q1, "Check the MOT", Some(Trigger::Yes)).await;
        tree.action(q2, "Buy insurance", Some(Trigger::No)).await;
        tree.action(q3, "Never shown", None).await;

        let mut walker = walker_for(&storage).await;
        walker.start(tree.survey_id, None).await.unwrap();
        walker.answer(q1, true).await.unwrap();
        assert_eq!(walker.progress(), 33);
        walker.answer(q2, false).await.unwrap();

        assert_eq!(
            walker.state(),
            WalkerState::Terminated {
                reason: TerminationReason::Normal
            }
        );
        assert_eq!(
            walker.action_plan().actions,
            vec!["Check the MOT".to_string(), "Buy insurance".to_string()]
        );
        assert!(walker.action_plan().terminate_message.is_none());
    }

    #[tokio::test]
    async fn test_answer_after_completion_is_rejected() {
        let storage = InMemoryStorage::new();
        let (survey_id, q1, _) = branching_tree(&storage).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();
        walker.answer(q1, false).await.unwrap();

        let err = walker.answer(q1, true).await.unwrap_err();
        assert!(matches!(err, SurveyError::SessionCompleted(_)));
    }

    #[tokio::test]
    async fn test_answering_off_path_question_is_rejected() {
        let storage = InMemoryStorage::new();
        let (survey_id, _, q2) = branching_tree(&storage).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();

        let err = walker.answer(q2, true).await.unwrap_err();
        assert!(matches!(err, SurveyError::NotOnPath(id) if id == q2));
        assert!(walker.responses().is_empty());
    }

    async fn linear_tree(storage: &InMemoryStorage, len: usize) -> (i64, Vec<i64>) {
        let mut tree = TreeBuilder::new(storage, "Linear").await;
        let mut ids = Vec::new();
        for i in 0..len {
            ids.push(tree.question(&format!("Q{}", i + 1)).await);
        }
        for pair in ids.windows(2) {
            tree.link(pair[0], Some(pair[1]), Some(pair[1])).await;
        }
        (tree.survey_id, ids)
    }

    #[tokio::test]
    async fn test_reanswer_discards_later_responses() {
        let storage = InMemoryStorage::new();
        let (survey_id, ids) = linear_tree(&storage, 4).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();
        walker.answer(ids[0], true).await.unwrap();
        walker.answer(ids[1], true).await.unwrap();
        walker.answer(ids[2], true).await.unwrap();
        assert_eq!(walker.responses().len(), 3);
        assert_eq!(walker.progress(), 75);

        walker.answer(ids[0], false).await.unwrap();

        assert_eq!(walker.responses().len(), 1);
        assert_eq!(walker.responses()[0].question_id, ids[0]);
        assert!(!walker.responses()[0].answer);
        assert_eq!(walker.current_question().map(|q| q.id), Some(ids[1]));
        assert_eq!(walker.progress(), 25);

        let session_id = walker.session_id().unwrap();
        let stored = storage.list_responses(session_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].answer);
    }

    #[tokio::test]
    async fn test_navigate_truncates_memory_only_until_next_answer() {
        let storage = InMemoryStorage::new();
        let (survey_id, ids) = linear_tree(&storage, 4).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();
        for id in &ids[..3] {
            walker.answer(*id, true).await.unwrap();
        }

        walker.navigate_to_question(ids[1]).unwrap();

        assert_eq!(walker.responses().len(), 2);
        assert_eq!(walker.current_question().map(|q| q.id), Some(ids[1]));
        assert_eq!(walker.progress(), 50);
        let session_id = walker.session_id().unwrap();
        assert_eq!(storage.list_responses(session_id).await.unwrap().len(), 3);

        walker.answer(ids[1], false).await.unwrap();

        assert_eq!(walker.responses().len(), 2);
        assert_eq!(walker.current_question().map(|q| q.id), Some(ids[2]));
        let stored = storage.list_responses(session_id).await.unwrap();
        assert_eq!(
            stored.iter().map(|r| r.question_id).collect::<Vec<_>>(),
            vec![ids[0], ids[1]]
        );
    }

    #[tokio::test]
    async fn test_navigate_reopens_terminated_walk() {
        let storage = InMemoryStorage::new();
        let (survey_id, q1, _) = branching_tree(&storage).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();
        walker.answer(q1, false).await.unwrap();
        assert!(walker.state().is_terminated());

        walker.navigate_to_question(q1).unwrap();
        assert_eq!(walker.state(), WalkerState::InProgress);
        assert!(walker.action_plan().terminate_message.is_none());

        walker.answer(q1, true).await.unwrap();
        assert_eq!(walker.state(), WalkerState::InProgress);
        assert_eq!(walker.responses().len(), 1);
    }

    #[tokio::test]
    async fn test_navigate_to_unknown_question_fails() {
        let storage = InMemoryStorage::new();
        let (survey_id, _) = linear_tree(&storage, 2).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();

        let err = walker.navigate_to_question(9999).unwrap_err();
        assert!(matches!(err, SurveyError::QuestionNotFound(9999)));
        assert!(walker.error().is_some());
    }

    #[tokio::test]
    async fn test_reset_clears_responses_and_opens_new_session() {
        let storage = InMemoryStorage::new();
        let (survey_id, ids) = linear_tree(&storage, 3).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, Some("bob")).await.unwrap();
        walker.answer(ids[0], true).await.unwrap();
        let old_session = walker.session_id().unwrap();

        walker.reset().await.unwrap();

        assert_ne!(walker.session_id(), Some(old_session));
        assert!(walker.responses().is_empty());
        assert_eq!(walker.current_question().map(|q| q.id), Some(ids[0]));
        assert_eq!(walker.progress(), 0);
        assert!(storage.list_responses(old_session).await.unwrap().is_empty());
        assert_eq!(
            walker.session().and_then(|s| s.respondent.as_deref()),
            Some("bob")
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_untouched() {
        let storage = InMemoryStorage::new();
        let (survey_id, ids) = linear_tree(&storage, 3).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();
        walker.answer(ids[0], true).await.unwrap();
        let before = walker.snapshot();

        storage.set_fail_writes(true);
        let err = walker.answer(ids[1], true).await.unwrap_err();
        assert!(matches!(err, SurveyError::Storage(_)));

        assert_eq!(walker.responses(), before.responses.as_slice());
        assert_eq!(walker.current_question().map(|q| q.id), Some(ids[1]));
        assert_eq!(walker.progress(), before.progress);
        assert!(walker.error().unwrap().contains("unavailable"));

        storage.set_fail_writes(false);
        walker.answer(ids[1], true).await.unwrap();
        assert!(walker.error().is_none());
        assert_eq!(walker.responses().len(), 2);
    }

    #[tokio::test]
    async fn test_dangling_successor_is_terminal() {
        let storage = InMemoryStorage::new();
        let mut tree = TreeBuilder::new(&storage, "Dangling").await;
        let q1 = tree.question("Only").await;
        tree.link(q1, Some(4242), None).await;

        let mut walker = walker_for(&storage).await;
        walker.start(tree.survey_id, None).await.unwrap();
        walker.answer(q1, true).await.unwrap();

        assert_eq!(
            walker.state(),
            WalkerState::Terminated {
                reason: TerminationReason::Normal
            }
        );
    }

    #[tokio::test]
    async fn test_resume_continues_open_session() {
        let storage = InMemoryStorage::new();
        let (survey_id, ids) = linear_tree(&storage, 4).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();
        walker.answer(ids[0], true).await.unwrap();
        walker.answer(ids[1], false).await.unwrap();
        let session_id = walker.session_id().unwrap();

        let resumed = SessionWalker::resume(Arc::new(storage.clone()), session_id)
            .await
            .unwrap();

        assert_eq!(resumed.state(), WalkerState::InProgress);
        assert_eq!(resumed.current_question().map(|q| q.id), Some(ids[2]));
        assert_eq!(resumed.progress(), 50);
        assert_eq!(resumed.responses().len(), 2);
    }

    #[tokio::test]
    async fn test_resume_recomputes_plan_of_completed_session() {
        let storage = InMemoryStorage::new();
        let (survey_id, q1, q2) = branching_tree(&storage).await;
        let mut tree = TreeBuilder::attach(&storage, survey_id);
        tree.action(q1, "Gather your tenancy agreement", Some(Trigger::Yes))
            .await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();
        walker.answer(q1, true).await.unwrap();
        walker.answer(q2, true).await.unwrap();
        let session_id = walker.session_id().unwrap();

        let resumed = SessionWalker::resume(Arc::new(storage.clone()), session_id)
            .await
            .unwrap();

        assert_eq!(
            resumed.state(),
            WalkerState::Terminated {
                reason: TerminationReason::EarlyExit
            }
        );
        assert_eq!(resumed.action_plan(), walker.action_plan());
        assert_eq!(
            resumed.action_plan().actions,
            vec!["Gather your tenancy agreement".to_string()]
        );
    }

    #[tokio::test]
    async fn test_current_plan_of_open_walk() {
        let storage = InMemoryStorage::new();
        let (survey_id, q1, _) = branching_tree(&storage).await;
        let mut tree = TreeBuilder::attach(&storage, survey_id);
        tree.action(q1, "Find your lease", None).await;

        let mut walker = walker_for(&storage).await;
        walker.start(survey_id, None).await.unwrap();
        assert!(walker.current_plan().actions.is_empty());

        walker.answer(q1, true).await.unwrap();
        assert!(walker.action_plan().actions.is_empty());
        assert_eq!(walker.current_plan().actions, vec!["Find your lease".to_string()]);
    }

    #[tokio::test]
    async fn test_resume_unknown_session() {
        let storage = InMemoryStorage::new();
        let err = SessionWalker::resume(Arc::new(storage), 77)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SurveyError::SessionNotFound(77)));
    }
}
