use crate::plan::QuestionNode;
use crate::storage::{
    InMemoryStorage, QuestionRepository, ResourceFields, ResourceRepository, SurveyRepository,
};
use shared_types::{Action, NewQuestion, Question, QuestionPatch, Response, Terminate, Trigger};

pub fn node(id: i64, action: Option<&str>, action_trigger: Option<Trigger>) -> QuestionNode {
    QuestionNode {
        question: Question {
            id,
            survey_id: 1,
            text: format!("Question {}", id),
            order_position: id,
            yes_leads_to: None,
            no_leads_to: None,
            hint_id: None,
            learn_id: None,
            action_id: action.map(|_| 100 + id),
            terminate_id: None,
            action_trigger,
            terminate_trigger: None,
            has_upload: false,
            created_at: 0,
        },
        action: action.map(|content| Action {
            id: 100 + id,
            content: content.to_string(),
            created_at: 0,
        }),
        terminate: None,
    }
}

pub fn response(id: i64, question_id: i64, answer: bool) -> Response {
    Response {
        id,
        session_id: 1,
        question_id,
        answer,
        created_at: 0,
        updated_at: 0,
    }
}

/// Builds a tree straight through the repositories, skipping editor checks.
pub struct TreeBuilder<'a> {
    storage: &'a InMemoryStorage,
    pub survey_id: i64,
    next_position: i64,
}

impl<'a> TreeBuilder<'a> {
    pub async fn new(storage: &'a InMemoryStorage, name: &str) -> Self {
        let survey = storage.create_survey(name, None).await.unwrap();
        Self {
            storage,
            survey_id: survey.id,
            next_position: 0,
        }
    }

    pub fn attach(storage: &'a InMemoryStorage, survey_id: i64) -> Self {
        Self {
            storage,
            survey_id,
            next_position: 1000,
        }
    }

    pub async fn question(&mut self, text: &str) -> i64 {
        let position = self.next_position;
        self.next_position += 1;
        self.question_at(text, position).await
    }

    pub async fn question_at(&mut self, text: &str, order_position: i64) -> i64 {
        self.storage
            .create_question(NewQuestion {
                survey_id: self.survey_id,
                text: text.to_string(),
                order_position,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn link(&mut self, question_id: i64, yes: Option<i64>, no: Option<i64>) {
        let patch = QuestionPatch {
            yes_leads_to: Some(yes),
            no_leads_to: Some(no),
            ..Default::default()
        };
        self.storage
            .update_question(question_id, &patch)
            .await
            .unwrap();
    }

    pub async fn action(&mut self, question_id: i64, content: &str, trigger: Option<Trigger>) {
        let action = ResourceRepository::<Action>::create_resource(self.storage, fields(content))
            .await
            .unwrap();
        let patch = QuestionPatch {
            action_id: Some(Some(action.id)),
            action_trigger: Some(trigger),
            ..Default::default()
        };
        self.storage
            .update_question(question_id, &patch)
            .await
            .unwrap();
    }

    pub async fn terminate(&mut self, question_id: i64, content: &str, trigger: Option<Trigger>) {
        let terminate =
            ResourceRepository::<Terminate>::create_resource(self.storage, fields(content))
                .await
                .unwrap();
        let patch = QuestionPatch {
            terminate_id: Some(Some(terminate.id)),
            terminate_trigger: Some(trigger),
            ..Default::default()
        };
        self.storage
            .update_question(question_id, &patch)
            .await
            .unwrap();
    }
}

fn fields(content: &str) -> ResourceFields {
    ResourceFields {
        title: None,
        content: content.to_string(),
    }
}
