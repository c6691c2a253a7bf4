//! Builders shared by state machine and runtime tests

use super::state::{ActiveSurvey, SessionContext};
use crate::credential::CredentialIssuer;
use crate::survey::{Answer, Question, QuestionKind, RemoteId, SetupField, SurveySummary};

pub(crate) fn summary(fields: &[&str]) -> SurveySummary {
    SurveySummary {
        title: "Onboarding".to_string(),
        question_count: 3,
        setup_fields: fields
            .iter()
            .map(|title| SetupField {
                title: (*title).to_string(),
            })
            .collect(),
    }
}

pub(crate) fn survey(fields: &[&str]) -> ActiveSurvey {
    ActiveSurvey {
        test_id: "42".to_string(),
        credential: CredentialIssuer::new(b"test-secret").issue("42").unwrap(),
        summary: summary(fields),
    }
}

pub(crate) fn session(fields: &[&str]) -> SessionContext {
    SessionContext {
        survey: survey(fields),
        session_id: RemoteId::Number(77),
    }
}

pub(crate) fn text_question(id: i64, is_last: bool) -> Question {
    Question {
        question_id: RemoteId::Number(id),
        kind: QuestionKind::Text,
        text: "What is your favourite colour?".to_string(),
        is_last,
        answers: vec![],
    }
}

/// Choice question with one unchecked answer per id
pub(crate) fn choice_question(kind: QuestionKind, answer_ids: &[i64], is_last: bool) -> Question {
    Question {
        question_id: RemoteId::Number(5),
        kind,
        text: "Pick".to_string(),
        is_last,
        answers: answer_ids
            .iter()
            .map(|id| Answer {
                id: RemoteId::Number(*id),
                text: format!("option {id}"),
                is_checked: false,
            })
            .collect(),
    }
}
