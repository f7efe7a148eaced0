//! Question nodes as traversal sees them, and the plan collector.

use crate::error::SurveyResult;
use crate::storage::{QuestionRepository, ResourceRepository, SurveyStorage};
use shared_types::{Action, Question, Response, Terminate, Trigger};
use std::collections::HashMap;
use tracing::warn;

/// A question with the action and terminate it references already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionNode {
    pub question: Question,
    pub action: Option<Action>,
    pub terminate: Option<Terminate>,
}

impl QuestionNode {
    pub fn id(&self) -> i64 {
        self.question.id
    }

    /// The terminate that fires for `answer`, if any.
    pub fn fired_terminate(&self, answer: bool) -> Option<&Terminate> {
        self.terminate
            .as_ref()
            .filter(|_| trigger_fires(self.question.terminate_trigger, answer))
    }

    /// The action content this answer contributes to the plan, if any.
    pub fn triggered_action(&self, answer: bool) -> Option<&str> {
        self.action
            .as_ref()
            .filter(|_| trigger_fires(self.question.action_trigger, answer))
            .map(|action| action.content.as_str())
            .filter(|content| !content.is_empty())
    }
}

/// An unset trigger always fires.
pub fn trigger_fires(trigger: Option<Trigger>, answer: bool) -> bool {
    trigger.map_or(true, |t| t.matches(answer))
}

/// `min(round(100 * answered / total), 100)`; zero for an empty tree.
pub fn progress(answered: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * answered + total) / (2 * total);
    rounded.min(100) as u8
}

/// Replay responses in order and gather the content of every action whose
/// trigger the recorded answer satisfies, first occurrence wins.
pub fn collect_actions(nodes: &[QuestionNode], responses: &[Response]) -> Vec<String> {
    let by_id: HashMap<i64, &QuestionNode> = nodes.iter().map(|n| (n.id(), n)).collect();
    let mut actions: Vec<String> = Vec::new();

    for response in responses {
        let Some(node) = by_id.get(&response.question_id) else {
            continue;
        };
        if let Some(content) = node.triggered_action(response.answer) {
            if !actions.iter().any(|a| a == content) {
                actions.push(content.to_string());
            }
        }
    }

    actions
}

/// Load a survey's questions ordered by position with their action and
/// terminate resolved. References to missing resources resolve to nothing.
pub async fn load_nodes(
    storage: &dyn SurveyStorage,
    survey_id: i64,
) -> SurveyResult<Vec<QuestionNode>> {
    let questions = storage.list_questions(survey_id).await?;

    let mut actions: HashMap<i64, Option<Action>> = HashMap::new();
    let mut terminates: HashMap<i64, Option<Terminate>> = HashMap::new();
    let mut nodes = Vec::with_capacity(questions.len());

    for question in questions {
        let action = match question.action_id {
            Some(id) => {
                if !actions.contains_key(&id) {
                    let loaded = ResourceRepository::<Action>::get_resource(storage, id).await?;
                    actions.insert(id, loaded);
                }
                let action = actions.get(&id).cloned().flatten();
                if action.is_none() {
                    warn!(question_id = question.id, action_id = id, "Question references a missing action");
                }
                action
            }
            None => None,
        };

        let terminate = match question.terminate_id {
            Some(id) => {
                if !terminates.contains_key(&id) {
                    let loaded =
                        ResourceRepository::<Terminate>::get_resource(storage, id).await?;
                    terminates.insert(id, loaded);
                }
                let terminate = terminates.get(&id).cloned().flatten();
                if terminate.is_none() {
                    warn!(question_id = question.id, terminate_id = id, "Question references a missing terminate");
                }
                terminate
            }
            None => None,
        };

        nodes.push(QuestionNode {
            question,
            action,
            terminate,
        });
    }

    Ok(nodes)
}
