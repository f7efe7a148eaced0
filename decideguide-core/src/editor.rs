//! Editor-side view of one decision tree.

use crate::error::{SurveyError, SurveyResult};
use crate::storage::{QuestionRepository, ResourceRepository, SurveyRepository, SurveyStorage};
use shared_types::{
    Action, Hint, Learn, NewQuestion, OrderUpdate, Question, QuestionPatch, ResourceKind, Survey,
    Terminate,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// The nodes of one survey, kept sorted by `order_position` and reconciled
/// with storage after every successful mutation.
pub struct TreeEditor {
    storage: Arc<dyn SurveyStorage>,
    survey: Survey,
    questions: Vec<Question>,
}

impl TreeEditor {
    pub async fn load(storage: Arc<dyn SurveyStorage>, survey_id: i64) -> SurveyResult<Self> {
        let survey = storage
            .get_survey(survey_id)
            .await?
            .ok_or(SurveyError::SurveyNotFound(survey_id))?;
        let questions = storage.list_questions(survey_id).await?;

        debug!(survey_id, question_count = questions.len(), "Loaded tree for editing");

        Ok(Self {
            storage,
            survey,
            questions,
        })
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn into_parts(self) -> (Survey, Vec<Question>) {
        (self.survey, self.questions)
    }

    fn find(&self, question_id: i64) -> SurveyResult<&Question> {
        self.questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or(SurveyError::QuestionNotFound(question_id))
    }

    fn position_taken(&self, position: i64, except: Option<i64>) -> bool {
        self.questions
            .iter()
            .any(|q| q.order_position == position && Some(q.id) != except)
    }

    fn sort(&mut self) {
        self.questions.sort_by_key(|q| (q.order_position, q.id));
    }

    /// Add a node at `order_position`; existing nodes keep their positions.
    pub async fn create_question(
        &mut self,
        text: &str,
        order_position: i64,
    ) -> SurveyResult<Question> {
        if self.position_taken(order_position, None) {
            return Err(SurveyError::InvalidOrder(format!(
                "position {} is already used in survey {}",
                order_position, self.survey.id
            )));
        }

        let question = self
            .storage
            .create_question(NewQuestion {
                survey_id: self.survey.id,
                text: text.to_string(),
                order_position,
            })
            .await?;

        info!(
            survey_id = self.survey.id,
            question_id = question.id,
            order_position,
            "Created question"
        );

        self.questions.push(question.clone());
        self.sort();
        Ok(question)
    }

    pub async fn update_question(
        &mut self,
        question_id: i64,
        patch: &QuestionPatch,
    ) -> SurveyResult<Question> {
        let current = self.find(question_id)?.clone();
        let patch = normalize_patch(patch);
        if patch.is_empty() {
            return Ok(current);
        }

        self.validate_patch(question_id, &patch).await?;

        let updated = self.storage.update_question(question_id, &patch).await?;
        debug!(question_id, "Updated question");

        let reposition = updated.order_position != current.order_position;
        if let Some(slot) = self.questions.iter_mut().find(|q| q.id == question_id) {
            *slot = updated.clone();
        }
        if reposition {
            self.sort();
        }
        Ok(updated)
    }

    async fn validate_patch(&self, question_id: i64, patch: &QuestionPatch) -> SurveyResult<()> {
        for (label, target) in [("yes", patch.yes_leads_to), ("no", patch.no_leads_to)] {
            if let Some(Some(target)) = target {
                if target == question_id {
                    return Err(SurveyError::InvalidPatch(format!(
                        "question {} cannot lead to itself on {}",
                        question_id, label
                    )));
                }
                if self.find(target).is_err() {
                    return Err(SurveyError::InvalidPatch(format!(
                        "{} successor {} is not a question of survey {}",
                        label, target, self.survey.id
                    )));
                }
            }
        }

        if let Some(position) = patch.order_position {
            if self.position_taken(position, Some(question_id)) {
                return Err(SurveyError::InvalidOrder(format!(
                    "position {} is already used in survey {}",
                    position, self.survey.id
                )));
            }
        }

        let storage = self.storage.as_ref();
        if let Some(Some(id)) = patch.hint_id {
            let found = ResourceRepository::<Hint>::get_resource(storage, id).await?;
            ensure_exists(ResourceKind::Hint, id, found)?;
        }
        if let Some(Some(id)) = patch.learn_id {
            let found = ResourceRepository::<Learn>::get_resource(storage, id).await?;
            ensure_exists(ResourceKind::Learn, id, found)?;
        }
        if let Some(Some(id)) = patch.action_id {
            let found = ResourceRepository::<Action>::get_resource(storage, id).await?;
            ensure_exists(ResourceKind::Action, id, found)?;
        }
        if let Some(Some(id)) = patch.terminate_id {
            let found = ResourceRepository::<Terminate>::get_resource(storage, id).await?;
            ensure_exists(ResourceKind::Terminate, id, found)?;
        }

        Ok(())
    }

    /// Remove a node. Other nodes that led to it become terminal on that
    /// branch.
    pub async fn delete_question(&mut self, question_id: i64) -> SurveyResult<()> {
        self.find(question_id)?;
        self.storage.delete_question(question_id).await?;

        self.questions.retain(|q| q.id != question_id);
        for question in &mut self.questions {
            if question.yes_leads_to == Some(question_id) {
                question.yes_leads_to = None;
            }
            if question.no_leads_to == Some(question_id) {
                question.no_leads_to = None;
            }
        }

        info!(survey_id = self.survey.id, question_id, "Deleted question");
        Ok(())
    }

    /// Apply a batch of new positions at once.
    pub async fn reorder(&mut self, updates: &[OrderUpdate]) -> SurveyResult<()> {
        let mut positions: HashMap<i64, i64> = self
            .questions
            .iter()
            .map(|q| (q.id, q.order_position))
            .collect();

        let mut seen = HashSet::new();
        for update in updates {
            if !positions.contains_key(&update.id) {
                return Err(SurveyError::InvalidOrder(format!(
                    "question {} is not part of survey {}",
                    update.id, self.survey.id
                )));
            }
            if !seen.insert(update.id) {
                return Err(SurveyError::InvalidOrder(format!(
                    "question {} appears more than once",
                    update.id
                )));
            }
            positions.insert(update.id, update.order_position);
        }

        let mut used = HashSet::new();
        if let Some(position) = positions.values().find(|p| !used.insert(**p)) {
            return Err(SurveyError::InvalidOrder(format!(
                "position {} would be used twice",
                position
            )));
        }

        self.storage.reorder_questions(updates).await?;

        for question in &mut self.questions {
            if let Some(position) = positions.get(&question.id) {
                question.order_position = *position;
            }
        }
        self.sort();

        info!(
            survey_id = self.survey.id,
            moved = updates.len(),
            "Reordered questions"
        );
        Ok(())
    }
}

/// Clearing a resource reference clears its trigger too.
fn normalize_patch(patch: &QuestionPatch) -> QuestionPatch {
    let mut patch = patch.clone();
    if patch.action_id == Some(None) {
        patch.action_trigger = Some(None);
    }
    if patch.terminate_id == Some(None) {
        patch.terminate_trigger = Some(None);
    }
    patch
}

fn ensure_exists<R>(kind: ResourceKind, id: i64, found: Option<R>) -> SurveyResult<()> {
    match found {
        Some(_) => Ok(()),
        None => Err(SurveyError::ResourceNotFound { kind, id }),
    }
}
