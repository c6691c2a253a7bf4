//! Wire types for the survey service

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier issued by the survey service.
///
/// The service is not consistent about id types, so both numeric and string
/// ids are accepted and echoed back in the same JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteId::Number(n) => write!(f, "{n}"),
            RemoteId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RemoteId {
    fn from(value: i64) -> Self {
        RemoteId::Number(value)
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        RemoteId::Text(value.to_string())
    }
}

/// A free-text field collected before the first question
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetupField {
    pub title: String,
}

/// Survey summary returned by `tests/current/summary`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SurveySummary {
    pub title: String,
    #[serde(default)]
    pub question_count: u32,
    #[serde(default, rename = "user_inputs")]
    pub setup_fields: Vec<SetupField>,
}

/// Question type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Text,
    Single,
    Multiple,
}

impl QuestionKind {
    pub fn is_choice(self) -> bool {
        !matches!(self, QuestionKind::Text)
    }
}

/// One selectable answer of a choice question
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Answer {
    pub id: RemoteId,
    pub text: String,
    #[serde(rename = "isChecked", default, deserialize_with = "deserialize_flag")]
    pub is_checked: bool,
}

/// A question as issued by the survey service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Question {
    pub question_id: RemoteId,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub text: String,
    #[serde(rename = "isLast", default, deserialize_with = "deserialize_flag")]
    pub is_last: bool,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Answer value sent as `answer_id` in `submit_answer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnswerPayload {
    /// Confirmed free-text reply
    Text(String),
    /// Ids of every checked answer, possibly empty
    Multiple(Vec<RemoteId>),
    /// The checked answer, `null` when nothing is checked
    Single(Option<RemoteId>),
}

/// Response of `POST sessions`
#[derive(Debug, Deserialize)]
pub(super) struct CreatedSession {
    session_id: SessionIdField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionIdField {
    One(RemoteId),
    Many(Vec<RemoteId>),
}

impl CreatedSession {
    /// The session id; the service sometimes wraps it in a one-element list
    pub(super) fn into_session_id(self) -> Option<RemoteId> {
        match self.session_id {
            SessionIdField::One(id) => Some(id),
            SessionIdField::Many(ids) => ids.into_iter().next(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreateSessionRequest<'a> {
    #[serde(rename = "userInputs")]
    pub user_inputs: &'a [String],
}

#[derive(Debug, Serialize)]
pub(super) struct SubmitAnswerRequest<'a> {
    pub question_id: &'a RemoteId,
    pub answer_id: &'a AnswerPayload,
}

/// Accepts `true`/`false`, `0`/`1` and `null`
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n != 0,
        None => false,
    })
}
