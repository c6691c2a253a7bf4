//! Events that can occur in a conversation

use crate::credential::Credential;
use crate::survey::{Question, RemoteId, SurveyErrorKind, SurveySummary};
use std::fmt;
use std::str::FromStr;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    /// `/start`, with the survey id from the link when present
    StartCommand {
        test_id: Option<String>,
    },
    UserText {
        text: String,
    },
    BeginPressed,
    TogglePressed {
        index: usize,
        was_checked: bool,
    },
    SubmitPressed,
    UnknownCallback {
        data: String,
    },

    // Survey service events
    SurveyLoaded {
        test_id: String,
        credential: Credential,
        summary: SurveySummary,
    },
    SessionOpened {
        session_id: RemoteId,
        question: Question,
    },
    /// The service accepted the answer on screen
    AnswerRecorded,
    /// The next question, or `None` once the session was completed
    Advanced {
        next: Option<Question>,
    },
    RequestFailed {
        step: SurveyStep,
        kind: SurveyErrorKind,
        message: String,
    },
}

/// The survey exchange an effect performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyStep {
    LoadSurvey,
    OpenSession,
    SubmitAnswer,
    Advance,
}

impl Event {
    /// Map a button payload to its event
    pub fn from_callback(data: &str) -> Event {
        match data.parse::<CallbackData>() {
            Ok(CallbackData::Begin) => Event::BeginPressed,
            Ok(CallbackData::Submit) => Event::SubmitPressed,
            Ok(CallbackData::Toggle { index, was_checked }) => {
                Event::TogglePressed { index, was_checked }
            }
            Err(_) => Event::UnknownCallback {
                data: data.to_string(),
            },
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::StartCommand { .. } => "start_command",
            Event::UserText { .. } => "user_text",
            Event::BeginPressed => "begin_pressed",
            Event::TogglePressed { .. } => "toggle_pressed",
            Event::SubmitPressed => "submit_pressed",
            Event::UnknownCallback { .. } => "unknown_callback",
            Event::SurveyLoaded { .. } => "survey_loaded",
            Event::SessionOpened { .. } => "session_opened",
            Event::AnswerRecorded => "answer_recorded",
            Event::Advanced { .. } => "advanced",
            Event::RequestFailed { .. } => "request_failed",
        }
    }
}

/// Compact button payloads: `start`, `question` and `answer <index> <0|1>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    Begin,
    Submit,
    Toggle { index: usize, was_checked: bool },
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackData::Begin => f.write_str("start"),
            CallbackData::Submit => f.write_str("question"),
            CallbackData::Toggle { index, was_checked } => {
                write!(f, "answer {index} {}", u8::from(*was_checked))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCallback(pub String);

impl FromStr for CallbackData {
    type Err = InvalidCallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCallback(s.to_string());
        let mut parts = s.split_whitespace();

        let parsed = match parts.next() {
            Some("start") => CallbackData::Begin,
            Some("question") => CallbackData::Submit,
            Some("answer") => {
                let index = parts
                    .next()
                    .and_then(|p| p.parse::<usize>().ok())
                    .ok_or_else(invalid)?;
                let was_checked = match parts.next() {
                    Some("0") => false,
                    Some("1") => true,
                    _ => return Err(invalid()),
                };
                CallbackData::Toggle { index, was_checked }
            }
            _ => return Err(invalid()),
        };

        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(parsed)
    }
}
