//! User-facing texts

use super::event::{CallbackData, SurveyStep};
use crate::survey::{Question, QuestionKind, SetupField, SurveyErrorKind, SurveySummary};
use crate::transport::Reply;

const CHECKED_MARKER: &str = "✅";
const BEGIN_LABEL: &str = "Начать тест";
const SUBMIT_LABEL: &str = "Отправить ответ";

pub fn welcome(summary: &SurveySummary) -> Reply {
    Reply::text(format!(
        "Добро пожаловать на тест: {}\nКоличество вопросов в тесте: {}",
        summary.title, summary.question_count
    ))
}

pub fn setup_intro() -> Reply {
    Reply::text("Перед началом заполним необходимые поля:")
}

pub fn setup_field(field: &SetupField) -> Reply {
    Reply::text(field.title.clone())
}

pub fn ready_to_begin() -> Reply {
    Reply::text("Можно начинать тест").with_action(BEGIN_LABEL, CallbackData::Begin.to_string())
}

/// A question view; choice questions get one row per answer
pub fn question(question: &Question) -> Reply {
    if question.kind == QuestionKind::Text {
        return Reply::text(format!("{}\n\nВведите ответ", question.text));
    }

    let hint = if question.kind == QuestionKind::Multiple {
        "несколько ответов"
    } else {
        "один ответ"
    };
    let mut reply = Reply::text(format!("{} ({hint})", question.text));

    for (index, answer) in question.answers.iter().enumerate() {
        let marker = if answer.is_checked { CHECKED_MARKER } else { "" };
        let payload = CallbackData::Toggle {
            index,
            was_checked: answer.is_checked,
        };
        reply = reply.with_action(format!("{marker} {}", answer.text), payload.to_string());
    }

    if question.has_selection() {
        reply = reply.with_action(SUBMIT_LABEL, CallbackData::Submit.to_string());
    }
    reply
}

pub fn confirmation(answer: &str) -> Reply {
    Reply::text(format!(
        "Ваш ответ: {answer}\nЕсли неправильно, то напишите еще раз"
    ))
    .with_action(SUBMIT_LABEL, CallbackData::Submit.to_string())
}

pub fn completed() -> Reply {
    Reply::text("Опрос пройден")
}

pub fn wrong_link() -> Reply {
    Reply::text("Убедитесь, что используете правильную ссылку.")
}

pub fn fallback() -> Reply {
    Reply::text("Перейди по ссылке с опросом")
}

/// Prompt for a failed survey request
///
/// An unknown survey means a bad link only while loading it; once a session
/// is open the user can just retry.
pub fn failure(step: SurveyStep, kind: SurveyErrorKind) -> Reply {
    match (step, kind) {
        (_, SurveyErrorKind::Auth) => {
            Reply::text("Сессия истекла. Перейдите по ссылке с опросом заново.")
        }
        (SurveyStep::LoadSurvey, SurveyErrorKind::NotFound) => wrong_link(),
        _ => Reply::text("Не удалось связаться с сервером опросов. Попробуйте еще раз."),
    }
}
